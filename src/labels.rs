//! Channel-label cleaning utilities.
//!
//! Clinical recording systems are inconsistent about electrode naming
//! ("LA1", "EEG LA 01-Ref", "LA01"). These helpers normalize labels to a
//! `<lead><two-digit contact>` form so selections written against one
//! naming convention match datasets recorded under another.

// Lead prefixes that mark a channel as non-intracranial (EKG leads,
// scalp electrodes riding along in the montage).
const NON_IEEG_LEADS: [&str; 4] = ["EKG", "O", "C", "ECG"];

/// Splits a label into its lead prefix and contact number, e.g.
/// `"LA12-Ref"` into `("LA", 12)`. Returns `None` when the label does not
/// start with a non-digit lead followed by digits.
fn split_lead_contact(label: &str) -> Option<(&str, u32)> {
    let first_digit = label.find(|c: char| c.is_ascii_digit())?;
    if first_digit == 0 {
        return None;
    }
    let digits_end = label[first_digit..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|offset| first_digit + offset)
        .unwrap_or(label.len());
    let contact = label[first_digit..digits_end].parse().ok()?;
    Some((&label[..first_digit], contact))
}

/// Cleans a single label: optional substring removal, optional
/// delimiter split (dropping everything before the first delimiter), then
/// normalization to a zero-padded two-digit contact. A label that does not
/// parse as `<lead><contact>` passes through otherwise unchanged.
pub fn clean_label(label: &str, remove_substr: Option<&str>, delimiter: Option<&str>) -> String {
    let mut label = label.to_string();

    if let Some(substr) = remove_substr {
        if !substr.is_empty() {
            label = label.replace(substr, "");
        }
    }

    if let Some(delim) = delimiter {
        if !delim.is_empty() {
            label = match label.split_once(delim) {
                Some((_, rest)) => rest.to_string(),
                None => String::new(),
            };
        }
    }

    match split_lead_contact(&label) {
        Some((lead, contact)) => format!("{}{:02}", lead.trim(), contact),
        None => label,
    }
}

/// Cleans every label in a list. See [`clean_label`].
pub fn clean_labels(
    labels: &[String],
    remove_substr: Option<&str>,
    delimiter: Option<&str>,
) -> Vec<String> {
    labels
        .iter()
        .map(|label| clean_label(label, remove_substr, delimiter))
        .collect()
}

/// Flags channels whose lead marks them as non-intracranial.
///
/// Returns one boolean per label; labels that don't parse are never
/// flagged.
pub fn find_non_ieeg(labels: &[String]) -> Vec<bool> {
    labels
        .iter()
        .map(|label| {
            split_lead_contact(label)
                .map(|(lead, _)| NON_IEEG_LEADS.contains(&lead))
                .unwrap_or(false)
        })
        .collect()
}

/// Normalizes a label list and flags which channels to keep.
///
/// Strips any `EEG` remnant from the lead, zero-pads the contact, and
/// marks non-intracranial channels for dropping. Intended for tidying the
/// column names of a retrieved series.
pub fn clean_channels(labels: &[String]) -> (Vec<String>, Vec<bool>) {
    let mut cleaned = Vec::with_capacity(labels.len());
    let mut keep = vec![true; labels.len()];

    for (index, label) in labels.iter().enumerate() {
        match split_lead_contact(label) {
            Some((lead, contact)) => {
                let lead = lead.replace("EEG", "");
                let lead = lead.trim();
                if NON_IEEG_LEADS.contains(&lead) {
                    keep[index] = false;
                }
                cleaned.push(format!("{}{:02}", lead, contact));
            }
            None => cleaned.push(label.clone()),
        }
    }

    (cleaned, keep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn contact_numbers_are_zero_padded() {
        assert_eq!(clean_label("LA1", None, None), "LA01");
        assert_eq!(clean_label("LA12", None, None), "LA12");
        assert_eq!(clean_label("RH 3", None, None), "RH03");
    }

    #[test]
    fn unparseable_labels_pass_through() {
        assert_eq!(clean_label("DC", None, None), "DC");
        assert_eq!(clean_label("1A", None, None), "1A");
        assert_eq!(clean_label("", None, None), "");
    }

    #[test]
    fn substring_removal_happens_before_parsing() {
        assert_eq!(clean_label("LA1-Ref", Some("-Ref"), None), "LA01");
    }

    #[test]
    fn delimiter_drops_the_first_segment() {
        assert_eq!(clean_label("Grid-LA1", None, Some("-")), "LA01");
        // Later delimiters are kept intact.
        assert_eq!(clean_label("Grid-LA1-x", None, Some("-")), "LA01");
    }

    #[test]
    fn trailing_text_after_contact_is_dropped() {
        assert_eq!(clean_label("LA1-Ref", None, None), "LA01");
    }

    #[test]
    fn clean_labels_maps_the_whole_list() {
        let cleaned = clean_labels(&labels(&["LA1", "LA2", "EKG1"]), None, None);
        assert_eq!(cleaned, labels(&["LA01", "LA02", "EKG01"]));
    }

    #[test]
    fn non_ieeg_mask() {
        let mask = find_non_ieeg(&labels(&["LA1", "EKG1", "ECG2", "O1", "DC"]));
        assert_eq!(mask, vec![false, true, true, true, false]);
    }

    #[test]
    fn clean_channels_strips_eeg_remnants_and_flags_drops() {
        let (cleaned, keep) = clean_channels(&labels(&["EEG LA1", "LA2", "EKG1"]));
        assert_eq!(cleaned, labels(&["LA01", "LA02", "EKG01"]));
        assert_eq!(keep, vec![true, true, false]);
    }
}
