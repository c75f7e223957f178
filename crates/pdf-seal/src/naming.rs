use crate::constants::{DEFAULT_OUTPUT_NAME, STAMPED_SUFFIX};

/// File name for the stamped document.
///
/// `contract.PDF` becomes `contract（已盖章）.pdf`. Without an original
/// name the generic default is used.
pub fn stamped_file_name(original: Option<&str>) -> String {
    let Some(original) = original.filter(|name| !name.is_empty()) else {
        return DEFAULT_OUTPUT_NAME.to_string();
    };

    let stem = match original.len().checked_sub(4) {
        Some(split)
            if original.is_char_boundary(split)
                && original[split..].eq_ignore_ascii_case(".pdf") =>
        {
            &original[..split]
        }
        _ => original,
    };

    format!("{}{}.pdf", stem, STAMPED_SUFFIX)
}
