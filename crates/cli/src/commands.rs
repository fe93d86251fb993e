//! Command handlers

use crate::{FillArgs, SourceArg};
use anyhow::{bail, Context as _, Result};
use forms::{
    FormBinder, FormBundle, FormCatalog, FormRepository, I18n, Lang, SetupConfig, Signature,
    SignatureMeta, SignaturePrefs, SignatureSource, SubmitOutcome, Submission,
};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Settings shared by all commands
pub struct Context {
    pub forms_root: PathBuf,
    pub config: PathBuf,
    pub lang: Lang,
}

impl Context {
    fn catalog(&self) -> Result<FormCatalog> {
        let catalog = FormRepository::new(&self.forms_root).discover(self.lang);
        catalog.require_any()?;
        Ok(catalog)
    }
}

fn find_form<'a>(catalog: &'a FormCatalog, key: &str) -> Result<&'a FormBundle> {
    catalog.get(key).with_context(|| {
        let known: Vec<&str> = catalog.keys().collect();
        format!("unknown form '{key}' (available: {})", known.join(", "))
    })
}

/// Parse `key=value`; the value may contain further `=`
pub fn parse_key_value(input: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{input}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{input}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

pub fn list(ctx: &Context, out: &mut impl Write) -> Result<()> {
    let catalog = ctx.catalog()?;
    debug!(root = %ctx.forms_root.display(), count = catalog.len(), "listing forms");
    for bundle in catalog.iter() {
        writeln!(out, "{}\t{}", bundle.key, bundle.name)?;
    }
    Ok(())
}

pub fn fields(ctx: &Context, form: &str, out: &mut impl Write) -> Result<()> {
    let catalog = ctx.catalog()?;
    let bundle = find_form(&catalog, form)?;

    let mut current_section: Option<String> = None;
    for field in FormBinder::new(&bundle.schema, &bundle.i18n).fields() {
        if current_section.as_ref() != Some(&field.section_key) {
            writeln!(out, "[{}]", field.section_title)?;
            current_section = Some(field.section_key.clone());
        }
        let mark = if field.required { "*" } else { "" };
        writeln!(out, "  {}{}\t{}", field.key, mark, field.label)?;
    }
    Ok(())
}

fn read_values(args: &FillArgs) -> Result<HashMap<String, String>> {
    let mut values: HashMap<String, String> = match &args.values {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("{} is not a JSON object of strings", path.display()))?
        }
        None => HashMap::new(),
    };
    values.extend(args.set.iter().cloned());
    Ok(values)
}

fn read_signature(args: &FillArgs) -> Result<Option<Signature>> {
    let Some(path) = &args.signature else {
        return Ok(None);
    };
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    pdf_core::detect_format(&bytes)
        .with_context(|| format!("{} is not a PNG or JPEG image", path.display()))?;

    let signature = match args.signature_source {
        SourceArg::Upload => Signature::uploaded(bytes),
        SourceArg::Draw => Signature {
            bytes,
            meta: SignatureMeta {
                source: SignatureSource::Draw,
                size_px: None,
            },
        },
    };
    Ok(Some(signature))
}

fn prefs(args: &FillArgs) -> SignaturePrefs {
    SignaturePrefs {
        keep_aspect_ratio: !args.no_keep_ratio,
        width_cm: args.width_cm,
        height_cm: args.height_cm,
        scale_mode: args.scale_mode.into(),
        align: args.align.into(),
        trim_whitespace: !args.no_trim,
    }
}

pub fn fill(ctx: &Context, args: &FillArgs, out: &mut impl Write) -> Result<()> {
    let config = SetupConfig::load(&ctx.config)
        .with_context(|| format!("invalid configuration {}", ctx.config.display()))?;
    let catalog = ctx.catalog()?;
    let bundle = find_form(&catalog, &args.form)?;

    let mut submission = Submission::defaults_for(&bundle.schema);
    submission.values = read_values(args)?;
    if let Some(stadt) = &args.stadt {
        submission.stadt = stadt.clone();
    }
    submission.datum = args.datum.clone();
    submission.signature = read_signature(args)?;
    submission.prefs = prefs(args);

    match forms::submit(bundle, &submission, &config.pdf_options)? {
        SubmitOutcome::Invalid { labels, message } => {
            warn!(form = %bundle.key, missing = labels.len(), "required fields empty");
            bail!(message)
        }
        SubmitOutcome::Document { file_name, bytes } => {
            let path = args.out.clone().unwrap_or_else(|| PathBuf::from(file_name));
            std::fs::write(&path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(form = %bundle.key, path = %path.display(), bytes = bytes.len(), "wrote document");
            writeln!(out, "{} {}", created_message(&bundle.i18n), path.display())?;
            Ok(())
        }
    }
}

fn created_message(i18n: &I18n) -> &str {
    i18n.get_or(forms::i18n::MSG_CREATED, forms::i18n::DEFAULT_MSG_CREATED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;

    fn write_form(root: &Path) {
        let dir = root.join("person");
        fs::create_dir_all(dir.join("i18n")).unwrap();
        fs::write(
            dir.join("schema.json"),
            r#"{ "name": "Person", "sections": [ { "key": "person", "title_i18n": "section.person", "fields": [
                { "key": "name", "label_i18n": "field.name", "required": true },
                { "key": "email" }
            ] } ] }"#,
        )
        .unwrap();
        fs::write(
            dir.join("i18n/de.json"),
            r#"{ "field.name": "Name", "section.person": "Person", "msg.created": "Erstellt:" }"#,
        )
        .unwrap();
    }

    fn context(root: &Path) -> Context {
        Context {
            forms_root: root.join("forms"),
            config: root.join("setup-config.json"),
            lang: Lang::De,
        }
    }

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_form(&dir.path().join("forms"));
        dir
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("vg_name=Muster"),
            Ok(("vg_name".to_string(), "Muster".to_string()))
        );
        assert_eq!(
            parse_key_value("note=a=b"),
            Ok(("note".to_string(), "a=b".to_string()))
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_list() {
        let dir = setup();
        let mut out = Vec::new();
        list(&context(dir.path()), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "person\tPerson\n");
    }

    #[test]
    fn test_list_without_forms_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = list(&context(dir.path()), &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("No forms available"));
    }

    #[test]
    fn test_fields() {
        let dir = setup();
        let mut out = Vec::new();
        fields(&context(dir.path()), "person", &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[Person]\n  person_name*\tName\n  person_email\temail\n"
        );
    }

    #[test]
    fn test_unknown_form() {
        let dir = setup();
        let err = fields(&context(dir.path()), "nope", &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "unknown form 'nope' (available: person)");
    }

    #[test]
    fn test_fill_missing_field() {
        let dir = setup();
        let args = FillArgs {
            form: "person".to_string(),
            ..Default::default()
        };
        let err = fill(&context(dir.path()), &args, &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Bitte Pflichtfelder ausfüllen.\n- Name");
    }

    #[test]
    fn test_fill_writes_pdf() {
        let dir = setup();
        let values = dir.path().join("values.json");
        fs::write(&values, r#"{ "person_name": "Alice", "person_email": "a@b.de" }"#).unwrap();
        let target = dir.path().join("out.pdf");

        let args = FillArgs {
            form: "person".to_string(),
            set: vec![("person_name".to_string(), "Bob".to_string())],
            values: Some(values),
            datum: "01.02.2024".to_string(),
            width_cm: 2.0,
            height_cm: 3.0,
            out: Some(target.clone()),
            ..Default::default()
        };
        let mut out = Vec::new();
        fill(&context(dir.path()), &args, &mut out).unwrap();

        let bytes = fs::read(&target).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("Erstellt: {}\n", target.display())
        );
    }

    #[test]
    fn test_fill_rejects_non_image_signature() {
        let dir = setup();
        let signature = dir.path().join("sig.txt");
        fs::write(&signature, "not an image").unwrap();

        let args = FillArgs {
            form: "person".to_string(),
            set: vec![("person_name".to_string(), "Bob".to_string())],
            signature: Some(signature),
            ..Default::default()
        };
        let err = fill(&context(dir.path()), &args, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("is not a PNG or JPEG image"));
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = setup();
        fs::write(dir.path().join("setup-config.json"), "{ nope").unwrap();
        let args = FillArgs {
            form: "person".to_string(),
            ..Default::default()
        };
        let err = fill(&context(dir.path()), &args, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}
