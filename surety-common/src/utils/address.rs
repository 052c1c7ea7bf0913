use serde::{Deserialize, Serialize};

/// Authenticated identity of a caller (airline, oracle, passenger or owner).
///
/// `Address` is a lightweight wrapper around `String`, designed to:
/// - Ensure type safety across APIs
/// - Enable strong `HashMap`/`HashSet` keys
/// - Provide readable formatting and conversions
///
/// Authentication happens outside this workspace; by the time an `Address`
/// reaches the engine it is trusted.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    /// Example:
    /// ```rust
    /// use surety_common::utils::Address;
    /// let id: Address = "airline-A".into();
    /// ```
    fn from(s: &str) -> Self {
        Address(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Address(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_address_construction_and_display() {
        let id = Address("0x6273".to_string());
        assert_eq!(id.0, "0x6273");
        assert_eq!(format!("{}", id), "0x6273");
    }

    #[test]
    fn test_address_conversions() {
        let a: Address = "airline-A".into();
        let b: Address = String::from("airline-A").into();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "airline-A");
    }

    #[test]
    fn test_address_hashing() {
        let mut map = HashMap::new();
        map.insert(Address("a1".into()), "registered");
        map.insert(Address("a2".into()), "pending");

        assert_eq!(map.get(&Address("a1".into())), Some(&"registered"));

        let set: HashSet<Address> = map.keys().cloned().collect();
        assert!(set.contains(&Address("a2".into())));
    }
}
