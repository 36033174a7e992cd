use std::hash::Hash;

/// Invert a map by swapping keys and values
pub fn invert_map<K, V, MK, MV>(original: MK) -> MV
where
    K: Ord + Hash + Eq,
    V: Ord + Hash + Eq + Clone,
    MK: IntoIterator<Item = (K, V)>,
    MV: FromIterator<(V, K)>,
{
    original
        .into_iter()
        .map(|(key, value)| (value, key))
        .collect()
}

/// Build an id-to-label map where id 0 is reserved for the padding label, followed by the given
/// labels in order (duplicates of the padding label are skipped)
pub fn label_map(pad_label: &str, labels: &[String]) -> std::collections::BTreeMap<usize, String> {
    std::iter::once(pad_label.to_string())
        .chain(
            labels
                .iter()
                .map(|label| label.trim().to_string())
                .filter(|label| !label.is_empty() && label != pad_label),
        )
        .enumerate()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn inverts_a_label_map() {
        let id2label = BTreeMap::from([(0, "[PAD]".to_string()), (1, "O".to_string())]);

        let label2id: BTreeMap<String, usize> = invert_map(id2label);

        assert_eq!(label2id.get("O"), Some(&1));
        assert_eq!(label2id.get("[PAD]"), Some(&0));
    }

    #[test]
    fn reserves_the_first_id_for_padding() {
        let labels = vec![
            "O".to_string(),
            " B-city ".to_string(),
            "[PAD]".to_string(),
            "".to_string(),
        ];

        let id2label = label_map("[PAD]", &labels);

        assert_eq!(
            id2label,
            BTreeMap::from([
                (0, "[PAD]".to_string()),
                (1, "O".to_string()),
                (2, "B-city".to_string()),
            ])
        );
    }
}
