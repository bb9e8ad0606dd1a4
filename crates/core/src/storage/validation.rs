//! Upload validation: size limit and extension allow-list.

use super::config::UploadPolicy;
use super::error::ValidationError;

/// Bytes in one megabyte (MiB).
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Split a file name into base name and extension.
///
/// The extension is the text from the last `.` of the final `/`-separated
/// segment, dot included; the base name is everything before it. Names without
/// a dot in their final segment have an empty extension.
#[must_use]
pub fn split_extension(file_name: &str) -> (&str, &str) {
    let segment_start = file_name.rfind('/').map_or(0, |i| i + 1);
    match file_name[segment_start..].rfind('.') {
        Some(dot) => file_name.split_at(segment_start + dot),
        None => (file_name, ""),
    }
}

/// Check a file's declared size and extension against the policy.
///
/// Size is checked first. A file is too large when
/// `size_bytes / BYTES_PER_MB >= max_size_mb`, evaluated exactly.
///
/// # Errors
///
/// Returns [`ValidationError::TooLarge`] or [`ValidationError::UnsupportedType`].
pub fn validate(
    file_name: &str,
    size_bytes: u64,
    policy: &UploadPolicy,
) -> Result<(), ValidationError> {
    if size_bytes >= policy.max_size_bytes() {
        return Err(ValidationError::TooLarge {
            size_bytes,
            max_mb: policy.max_size_mb,
        });
    }

    let (_, extension) = split_extension(file_name);
    if !policy.is_extension_allowed(extension) {
        return Err(ValidationError::UnsupportedType {
            extension: extension.to_string(),
        });
    }

    Ok(())
}

/// Render a byte count as megabytes with two decimals.
///
/// Exact ties round to even, so 10.125 MB renders as `10.12`.
#[must_use]
pub fn format_megabytes(size_bytes: u64) -> String {
    let mb = u128::from(BYTES_PER_MB);
    let scaled = u128::from(size_bytes) * 100;
    let (mut hundredths, remainder) = (scaled / mb, scaled % mb);
    if remainder * 2 > mb || (remainder * 2 == mb && hundredths % 2 == 1) {
        hundredths += 1;
    }
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn policy() -> UploadPolicy {
        UploadPolicy::new()
            .with_max_size_mb(10)
            .with_allowed_extensions([".png", ".jpg"])
    }

    #[rstest]
    #[case("photo.png", ("photo", ".png"))]
    #[case("archive.tar.gz", ("archive.tar", ".gz"))]
    #[case("README", ("README", ""))]
    #[case(".png", ("", ".png"))]
    #[case("dir.v2/photo", ("dir.v2/photo", ""))]
    #[case("dir/photo.JPG", ("dir/photo", ".JPG"))]
    #[case("photo.", ("photo", "."))]
    fn test_split_extension(#[case] name: &str, #[case] expected: (&str, &str)) {
        assert_eq!(split_extension(name), expected);
    }

    #[test]
    fn test_valid_file_passes() {
        assert!(validate("photo.png", 2 * BYTES_PER_MB, &policy()).is_ok());
        assert!(validate("photo.jpg", 0, &policy()).is_ok());
    }

    #[test]
    fn test_size_at_limit_is_too_large() {
        let err = validate("photo.png", 10 * BYTES_PER_MB, &policy()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLarge {
                size_bytes: 10 * BYTES_PER_MB,
                max_mb: 10
            }
        );
        assert!(validate("photo.png", 10 * BYTES_PER_MB - 1, &policy()).is_ok());
    }

    #[test]
    fn test_too_large_message_reports_sizes() {
        let err = validate("big.png", 15 * BYTES_PER_MB, &policy()).unwrap_err();
        assert_eq!(err.to_string(), "image size 15.00 MB exceeds the 10 MB limit");
    }

    #[test]
    fn test_too_large_message_rounds_ties_to_even() {
        let size = 10 * BYTES_PER_MB + BYTES_PER_MB / 8;
        let err = validate("big.png", size, &policy()).unwrap_err();
        assert_eq!(err.to_string(), "image size 10.12 MB exceeds the 10 MB limit");
    }

    #[test]
    fn test_size_checked_before_extension() {
        let err = validate("doc.pdf", 20 * BYTES_PER_MB, &policy()).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
    }

    #[rstest]
    #[case("doc.pdf", ".pdf")]
    #[case("photo.PNG", ".PNG")]
    #[case("photo", "")]
    #[case("photo.png.exe", ".exe")]
    fn test_unsupported_type(#[case] name: &str, #[case] extension: &str) {
        let err = validate(name, BYTES_PER_MB, &policy()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedType {
                extension: extension.to_string()
            }
        );
    }

    #[rstest]
    #[case(0, "0.00")]
    #[case(BYTES_PER_MB, "1.00")]
    #[case(15 * BYTES_PER_MB, "15.00")]
    #[case(BYTES_PER_MB + BYTES_PER_MB / 2, "1.50")]
    #[case(BYTES_PER_MB / 200, "0.00")]
    #[case(BYTES_PER_MB / 200 + 1, "0.01")]
    #[case(BYTES_PER_MB * 2 - 1, "2.00")]
    #[case(BYTES_PER_MB / 8, "0.12")]
    #[case(10 * BYTES_PER_MB + BYTES_PER_MB / 8, "10.12")]
    #[case(10 * BYTES_PER_MB + 3 * BYTES_PER_MB / 8, "10.38")]
    #[case(BYTES_PER_MB / 8 * 5, "0.62")]
    fn test_format_megabytes(#[case] size: u64, #[case] expected: &str) {
        assert_eq!(format_megabytes(size), expected);
    }
}
