// Output filename handling for delivered PDFs.

pub const PDF_EXTENSION: &str = ".pdf";
pub const FALLBACK_BASENAME: &str = "resume";
const SEPARATOR: char = '_';

/// Maps every character of `name` outside ASCII letters, digits, `-` and `_`
/// to `_`, one for one. Only an empty name falls back to `resume`.
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() {
        return FALLBACK_BASENAME.to_string();
    }
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == SEPARATOR {
                c
            } else {
                SEPARATOR
            }
        })
        .collect()
}

/// Sanitized name with the `.pdf` extension appended.
pub fn output_filename(name: &str) -> String {
    format!("{}{}", sanitize_filename(name), PDF_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spaces_and_punctuation_replaced() {
        assert_eq!(output_filename("Jane Doe Resume!"), "Jane_Doe_Resume_.pdf");
        assert_eq!(sanitize_filename("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_filename("my-cv_2024"), "my-cv_2024");
    }

    #[test]
    fn test_non_ascii_replaced_per_char() {
        assert_eq!(sanitize_filename("José"), "Jos_");
        assert_eq!(sanitize_filename("履歴書"), "___");
    }

    #[test]
    fn test_padding_becomes_separators() {
        assert_eq!(output_filename("  Jane Doe  "), "__Jane_Doe__.pdf");
        assert_eq!(output_filename("   "), "___.pdf");
        assert_eq!(output_filename("\tcv\n"), "_cv_.pdf");
    }

    #[test]
    fn test_extension_in_name_is_sanitized() {
        assert_eq!(output_filename("cv.pdf"), "cv_pdf.pdf");
        assert_eq!(output_filename("CV.PDF"), "CV_PDF.pdf");
        assert_eq!(output_filename(".pdf"), "_pdf.pdf");
    }

    #[test]
    fn test_empty_falls_back() {
        assert_eq!(sanitize_filename(""), "resume");
        assert_eq!(output_filename(""), "resume.pdf");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "Jane Doe Resume!",
            "",
            "  padded  ",
            "résumé.pdf",
            "../../etc/passwd",
            "already_clean-name",
            "x.pdf.pdf",
            "tab\tand\nnewline",
        ];
        for input in inputs {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once, "input {input:?}");
            if !input.is_empty() {
                assert_eq!(once.chars().count(), input.chars().count(), "input {input:?}");
            }
            assert!(once
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }
}
