//! Courier - Routing
//!
//! MQTT topic pattern parsing and the subscription matcher.
//!
//! # Overview
//!
//! - [`TopicPattern`] - a validated MQTT subscription pattern (`+` matches
//!   exactly one level, `#` matches one or more remaining levels and is only
//!   legal as the final segment)
//! - [`TopicTree`] - a prefix tree over fixed segments mapping concrete
//!   topics to the values of every matching pattern, in insertion order
//!
//! The tree is compiled once at startup from configuration. Matching is pure:
//! repeated lookups of the same topic return the same list.
//!
//! # Example
//!
//! ```
//! use courier_routing::{TopicPattern, TopicTree};
//!
//! let mut tree = TopicTree::new();
//! tree.insert(TopicPattern::parse("sensors/+/temp").unwrap(), "a");
//! tree.insert(TopicPattern::parse("sensors/#").unwrap(), "b");
//!
//! // Insertion order is preserved among matches
//! assert_eq!(tree.matches("sensors/kitchen/temp"), vec![&"a", &"b"]);
//! assert_eq!(tree.matches("sensors/kitchen/hum"), vec![&"b"]);
//! assert!(tree.matches("doors/front").is_empty());
//! ```

mod pattern;
mod tree;

pub use pattern::{PatternError, Segment, TopicPattern};
pub use tree::TopicTree;
