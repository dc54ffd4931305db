use crate::error::RegistryError;
use crate::logging::{LogEvent, RegistryLogger, Severity};
use std::path::{MAIN_SEPARATOR, Path};

/// Verifies that `raw` names an existing directory and returns it normalized.
///
/// The failure is reported at fatal severity before it is returned: no registry exists
/// afterwards to report it later.
pub(crate) fn validate_base_path(
    raw: &str,
    logger: &dyn RegistryLogger,
) -> Result<String, RegistryError> {
    let is_dir = Path::new(raw).metadata().is_ok_and(|meta| meta.is_dir());

    if !is_dir {
        logger.log(
            Severity::Fatal,
            &LogEvent::new("Unable to open the components directory").path(Path::new(raw)),
        );
        return Err(RegistryError::ComponentPathNotFound {
            message: raw.to_owned().into(),
            context: None,
        });
    }

    Ok(normalize_base_path(raw))
}

/// Collapses trailing separators into exactly one.
pub(crate) fn normalize_base_path(raw: &str) -> String {
    let mut path = raw.trim_end_matches(is_separator).to_owned();
    path.push(MAIN_SEPARATOR);
    path
}

pub(crate) const fn is_separator(c: char) -> bool {
    c == '/' || c == MAIN_SEPARATOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::TracingLogger;
    use proptest::prelude::*;

    #[test]
    fn normalize_appends_a_single_separator() {
        let sep = MAIN_SEPARATOR;
        assert_eq!(normalize_base_path("components"), format!("components{sep}"));
        assert_eq!(normalize_base_path("components/"), format!("components{sep}"));
        assert_eq!(normalize_base_path("components///"), format!("components{sep}"));
        assert_eq!(normalize_base_path("/"), sep.to_string());
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = validate_base_path("", &TracingLogger).unwrap_err();
        assert!(matches!(err, RegistryError::ComponentPathNotFound { .. }));
    }

    #[test]
    fn existing_directory_is_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        let raw = tmp.path().to_str().unwrap();

        let base = validate_base_path(raw, &TracingLogger).unwrap();
        assert!(base.starts_with(raw));
        assert!(base.ends_with(MAIN_SEPARATOR));
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in "[a-z/]{1,24}") {
            let once = normalize_base_path(&raw);

            prop_assert_eq!(&normalize_base_path(&once), &once);
            prop_assert_eq!(&normalize_base_path(&format!("{raw}/")), &once);
            prop_assert!(once.ends_with(MAIN_SEPARATOR));
            prop_assert!(once.len() == 1 || !once[..once.len() - 1].ends_with(is_separator));
        }
    }
}
