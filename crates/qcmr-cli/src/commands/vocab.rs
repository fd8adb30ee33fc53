use qcmr_core::config::AssemblerConfig;
use qcmr_core::error::QcmrError;
use qcmr_core::vocabulary::load_vocabulary;
use std::path::Path;

pub fn list(config: &AssemblerConfig) -> Result<(), QcmrError> {
    let vocabularies = config.vocabulary_set()?;
    println!("Category vocabularies:\n");
    for v in vocabularies.iter() {
        let source = if config.vocabularies.contains_key(&v.section) {
            " [override]"
        } else {
            ""
        };
        println!(
            "  {:<18} v{}  {} labels -> {} categories{}",
            v.section,
            v.version,
            v.labels.len(),
            v.keys().len(),
            source
        );
        if let Some(ref desc) = v.description {
            println!("                     {}", desc);
        }
    }
    Ok(())
}

pub fn show(config: &AssemblerConfig, section: &str) -> Result<(), QcmrError> {
    let vocabularies = config.vocabulary_set()?;
    let v = vocabularies.get(section)?;

    println!("{} (version {})\n", v.section, v.version);
    if let Some(ref desc) = v.description {
        println!("{}\n", desc);
    }

    let width = v.labels.keys().map(|l| l.len()).max().unwrap_or(10);
    for (label, key) in &v.labels {
        println!("  {:<width$}  -> {}", label, key, width = width);
    }
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), QcmrError> {
    let v = load_vocabulary(file)?;
    println!(
        "Valid: {} (v{}), {} labels mapping to {} categories",
        v.section,
        v.version,
        v.labels.len(),
        v.keys().len()
    );
    Ok(())
}
