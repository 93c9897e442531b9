use std::collections::BTreeSet;

use tracing::warn;

use crate::image_error::ImageError;

const DEFAULT_ALLOWED: [&str; 3] = ["sqheaven-pg:latest", "sqheaven-pg:dev", "sqheaven-pg:custom"];

/// Image tags a SQHeaven container may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedImages(BTreeSet<String>);

impl AllowedImages {
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0.into_iter().collect()
    }
}

impl Default for AllowedImages {
    fn default() -> Self {
        DEFAULT_ALLOWED.iter().map(|tag| tag.to_string()).collect()
    }
}

impl FromIterator<String> for AllowedImages {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Checks the image of a located container against the allow-list.
/// `None` means no container was found.
pub fn validate_image(tag: Option<&str>, allowed: &AllowedImages) -> Result<(), ImageError> {
    let tag = tag.ok_or(ImageError::ContainerNotRunning)?;

    if !allowed.contains(tag) {
        warn!(image = tag, "container is running an image outside the allow-list");
        return Err(ImageError::UntrustedImage(tag.to_owned()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_allowed_tag_passes() {
        let allowed = AllowedImages::default();
        for tag in DEFAULT_ALLOWED {
            assert_eq!(validate_image(Some(tag), &allowed), Ok(()));
        }
    }

    #[test]
    fn tags_outside_the_set_are_untrusted() {
        let allowed = AllowedImages::default();
        for tag in [
            "postgres:16",
            "sqheaven-pg",
            "sqheaven-pg:latest ",
            "SQHEAVEN-PG:LATEST",
            "evil/sqheaven-pg:latest",
            "",
        ] {
            assert_eq!(
                validate_image(Some(tag), &allowed),
                Err(ImageError::UntrustedImage(tag.to_owned()))
            );
        }
    }

    #[test]
    fn absent_container_is_not_running() {
        assert_eq!(
            validate_image(None, &AllowedImages::default()),
            Err(ImageError::ContainerNotRunning)
        );
    }

    #[test]
    fn custom_allow_list_replaces_defaults() {
        let allowed: AllowedImages = vec!["sqheaven-pg:ci".to_owned()].into_iter().collect();
        assert!(validate_image(Some("sqheaven-pg:ci"), &allowed).is_ok());
        assert!(validate_image(Some("sqheaven-pg:latest"), &allowed).is_err());
    }
}
