use qcmr_core::error::QcmrError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), QcmrError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
