//! Tree document: settings, snapshots, history, named trees and the editor

mod fields;

pub mod editor;
pub mod history;
pub mod named;
pub mod properties;
pub mod snapshot;

pub use editor::{TreeEditor, TreeEvent, ALLOCATION_GROUP};
pub use history::{History, StateLog};
pub use named::{AbilityTrees, DEFAULT_TREE_NAME};
pub use properties::{CharacterClass, Properties};
pub use snapshot::Snapshot;
