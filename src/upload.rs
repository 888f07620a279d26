//! Checks performed on an upload before it reaches the extractor.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("{0} is not a .zip file")]
    NotZip(String),
    #[error("{name} is {size} bytes, larger than the {max} byte limit")]
    TooLarge { name: String, size: u64, max: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_size: u64,
}

impl UploadPolicy {
    pub const DEFAULT_MAX_SIZE: u64 = 50 * 1024 * 1024;

    /// Accept `.zip` files (any case) no larger than `max_size`.
    pub fn validate(&self, file_name: &str, size: u64) -> Result<(), UploadError> {
        if !file_name.to_ascii_lowercase().ends_with(".zip") {
            return Err(UploadError::NotZip(file_name.to_string()));
        }
        if size > self.max_size {
            return Err(UploadError::TooLarge {
                name: file_name.to_string(),
                size,
                max: self.max_size,
            });
        }
        Ok(())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size: Self::DEFAULT_MAX_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_zip_within_limit() {
        let policy = UploadPolicy { max_size: 10 };
        assert_eq!(policy.validate("site.ZIP", 10), Ok(()));
    }

    #[test]
    fn rejects_other_extensions() {
        let err = UploadPolicy::default().validate("site.tar.gz", 1).unwrap_err();
        assert_eq!(err, UploadError::NotZip("site.tar.gz".to_string()));
    }

    #[test]
    fn rejects_oversized_archives() {
        let policy = UploadPolicy { max_size: 10 };
        assert!(matches!(
            policy.validate("site.zip", 11),
            Err(UploadError::TooLarge { size: 11, max: 10, .. })
        ));
    }
}
