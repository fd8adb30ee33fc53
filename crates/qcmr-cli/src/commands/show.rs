use qcmr_core::bundle::TableBundle;
use qcmr_core::error::QcmrError;
use std::path::Path;

use crate::output;

pub fn run(bundle_dir: &Path, section: Option<&str>, output_format: &str) -> Result<(), QcmrError> {
    let bundle = TableBundle::read(bundle_dir)?;

    match section {
        Some(name) => {
            let table = bundle.get(name)?;
            match output_format {
                "json" => output::json::print(table)?,
                _ => output::table::print_table(name, table),
            }
        }
        None => match output_format {
            "json" => output::json::print(&bundle)?,
            _ => output::table::print_bundle(&bundle),
        },
    }
    Ok(())
}
