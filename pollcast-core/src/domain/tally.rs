use std::{collections::HashMap, fmt};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use super::poll::{OptionId, PollOption};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyEntry {
    pub label: String,
    pub count: u64,
}

/// Point-in-time vote counts per option, in option order.
///
/// Serialized as a JSON object `{label: count}`. Every option of the poll is
/// present, zero-vote options included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    entries: Vec<TallyEntry>,
}

impl Tally {
    /// Combine the poll's options with grouped counts. Options absent from
    /// `counts` default to zero; counts for unknown options are ignored.
    pub fn from_counts(options: &[PollOption], counts: &HashMap<OptionId, u64>) -> Self {
        let entries = options
            .iter()
            .map(|option| TallyEntry {
                label: option.label.clone(),
                count: counts.get(&option.id).copied().unwrap_or(0),
            })
            .collect();
        Self { entries }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(label, count)| TallyEntry {
                    label: label.into(),
                    count,
                })
                .collect(),
        }
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.count)
    }

    /// Sum of all counts; equals the number of committed votes in the snapshot.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    pub fn entries(&self) -> &[TallyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Tally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.label, &entry.count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Tally {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TallyVisitor;

        impl<'de> Visitor<'de> for TallyVisitor {
            type Value = Tally;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of option label to vote count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Tally, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((label, count)) = access.next_entry::<String, u64>()? {
                    entries.push(TallyEntry { label, count });
                }
                Ok(Tally { entries })
            }
        }

        deserializer.deserialize_map(TallyVisitor)
    }
}

/// Title plus current tally, as returned by the poll read endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSnapshot {
    pub title: String,
    pub votes: Tally,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(label: &str, position: i32) -> PollOption {
        PollOption {
            id: OptionId::new(),
            label: label.to_string(),
            position,
        }
    }

    #[test]
    fn zero_vote_options_are_listed() {
        let options = vec![option("A", 0), option("B", 1), option("C", 2)];
        let mut counts = HashMap::new();
        counts.insert(options[1].id, 3);
        counts.insert(OptionId::new(), 9);

        let tally = Tally::from_counts(&options, &counts);

        assert_eq!(tally, Tally::from_pairs([("A", 0), ("B", 3), ("C", 0)]));
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn serializes_as_ordered_object() {
        let tally = Tally::from_pairs([("Pizza", 2), ("Apple", 0)]);
        let json = serde_json::to_string(&tally).unwrap();
        assert_eq!(json, r#"{"Pizza":2,"Apple":0}"#);

        let back: Tally = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tally);
    }
}
