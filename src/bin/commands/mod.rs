pub mod config;
pub mod init;
pub mod status;
pub mod validate;

use devdb::OutputFormat;
use serde::Serialize;

/// Print `value` as JSON when the format asks for it
///
/// Returns `false` for non-JSON formats so the caller prints text instead.
pub(crate) fn print_json<T: Serialize>(value: &T, output_format: OutputFormat) -> bool {
    match output_format.to_json(value) {
        Some(Ok(json)) => {
            println!("{}", json);
            true
        }
        Some(Err(e)) => {
            eprintln!("Error serializing output: {}", e);
            true
        }
        None => false,
    }
}
