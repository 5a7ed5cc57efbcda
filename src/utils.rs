use anyhow::{bail, Error};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(try_from = "Vec<T>", into = "Vec<T>")]
pub struct NonEmptyVec<T: Clone>(Vec<T>);

impl<T: Clone> NonEmptyVec<T> {
    pub fn new(t: T) -> Self {
        Self(vec![t])
    }

    pub fn maybe_new(v: Vec<T>) -> Option<Self> {
        Self::try_from(v).ok()
    }

    pub fn first(&self) -> &T {
        &self.0[0]
    }
}

impl<T: Clone> TryFrom<Vec<T>> for NonEmptyVec<T> {
    type Error = Error;

    fn try_from(v: Vec<T>) -> Result<NonEmptyVec<T>, Error> {
        if v.is_empty() {
            bail!("cannot create a NonEmptyVec from an empty Vec")
        }
        Ok(NonEmptyVec(v))
    }
}

impl<T: Clone> From<NonEmptyVec<T>> for Vec<T> {
    fn from(NonEmptyVec(v): NonEmptyVec<T>) -> Vec<T> {
        v
    }
}

impl<T: Clone> AsRef<[T]> for NonEmptyVec<T> {
    fn as_ref(&self) -> &[T] {
        &self.0
    }
}

impl<T: Clone> Deref for NonEmptyVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

/// Turns an element identifier into a label, e.g. `age_over_21` into `Age Over 21`.
///
/// camelCase identifiers are split on their uppercase letters as well.
pub fn to_human_readable_string(value: impl Into<String>) -> String {
    let spaced = value.into().chars().fold(String::new(), |mut acc, c| {
        if c == '_' || c == '-' {
            acc.push(' ');
            return acc;
        }
        if c.is_uppercase() && acc.chars().last().is_some_and(char::is_lowercase) {
            acc.push(' ');
        }
        acc.push(c);
        acc
    });

    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Removes repeated entries while keeping the first occurrence of each.
pub(crate) fn dedup_ordered<S: AsRef<str>>(items: &[S]) -> Vec<&str> {
    let mut seen = Vec::with_capacity(items.len());
    for item in items {
        let item = item.as_ref();
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_readable_labels() {
        assert_eq!(to_human_readable_string("given_name"), "Given Name");
        assert_eq!(to_human_readable_string("age_over_21"), "Age Over 21");
        assert_eq!(
            to_human_readable_string("vehicle_identification_number"),
            "Vehicle Identification Number"
        );
        assert_eq!(to_human_readable_string("DHS_compliance"), "DHS Compliance");
        assert_eq!(to_human_readable_string("dateOfBirth"), "Date Of Birth");
    }

    #[test]
    fn non_empty_vec_rejects_empty() {
        assert!(NonEmptyVec::<String>::maybe_new(vec![]).is_none());
        let v: NonEmptyVec<u8> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(*v.first(), 1);
        assert!(serde_json::from_str::<NonEmptyVec<u8>>("[]").is_err());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup_ordered(&["a", "b", "a", "c", "b"]), vec!["a", "b", "c"]);
    }
}
