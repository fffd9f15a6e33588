use std::collections::BTreeSet;

use sceneview_common::NodeId;
use uuid::Uuid;

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Command on macOS, the Windows/Super key elsewhere.
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Self::NONE
        }
    }

    /// Whether these modifiers request toggle selection on `platform`.
    pub fn is_toggle(&self, platform: Platform) -> bool {
        match platform {
            Platform::MacOs => self.meta || self.shift,
            Platform::Other => self.ctrl || self.shift,
        }
    }
}

/// Host platform family, as far as modifier conventions go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Hits replace the previous selection.
    Direct,
    /// Hits flip membership in the previous selection.
    Toggle,
}

/// Token shared by every action of one pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpSeq(pub Uuid);

impl OpSeq {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OpSeq {
    fn default() -> Self {
        Self::new()
    }
}

/// New selection after a pick.
///
/// Toggle mode takes the symmetric difference of `previous` and the hit set,
/// direct mode replaces. An empty result falls back to `{root}` when a root is
/// given.
pub fn resolve_selection<I>(
    previous: &BTreeSet<NodeId>,
    hits: I,
    mode: SelectionMode,
    root: Option<NodeId>,
) -> BTreeSet<NodeId>
where
    I: IntoIterator<Item = NodeId>,
{
    let hits: BTreeSet<NodeId> = hits.into_iter().collect();
    let mut selection = match mode {
        SelectionMode::Direct => hits,
        SelectionMode::Toggle => previous.symmetric_difference(&hits).copied().collect(),
    };
    if selection.is_empty() {
        if let Some(root) = root {
            selection.insert(root);
        }
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<NodeId> {
        (0..n).map(|_| NodeId::new()).collect()
    }

    #[test]
    fn toggle_modifiers_per_platform() {
        assert!(Modifiers::meta().is_toggle(Platform::MacOs));
        assert!(!Modifiers::meta().is_toggle(Platform::Other));
        assert!(Modifiers::ctrl().is_toggle(Platform::Other));
        assert!(!Modifiers::ctrl().is_toggle(Platform::MacOs));
        assert!(Modifiers::shift().is_toggle(Platform::MacOs));
        assert!(Modifiers::shift().is_toggle(Platform::Other));
        assert!(!Modifiers::NONE.is_toggle(Platform::current()));
    }

    #[test]
    fn direct_replaces_selection() {
        let n = ids(3);
        let previous = BTreeSet::from([n[0], n[1]]);
        let next = resolve_selection(&previous, [n[2]], SelectionMode::Direct, None);
        assert_eq!(next, BTreeSet::from([n[2]]));
    }

    #[test]
    fn toggle_is_symmetric_difference() {
        let n = ids(3);
        let previous = BTreeSet::from([n[0], n[1]]);
        let next = resolve_selection(&previous, [n[1], n[2]], SelectionMode::Toggle, None);
        assert_eq!(next, BTreeSet::from([n[0], n[2]]));
    }

    #[test]
    fn toggling_twice_restores_selection() {
        let n = ids(4);
        let previous = BTreeSet::from([n[0], n[1]]);
        let hits = [n[1], n[2], n[3]];
        let once = resolve_selection(&previous, hits, SelectionMode::Toggle, None);
        let twice = resolve_selection(&once, hits, SelectionMode::Toggle, None);
        assert_eq!(twice, previous);
    }

    #[test]
    fn empty_result_falls_back_to_root() {
        let n = ids(2);
        let root = n[1];
        let next = resolve_selection(&BTreeSet::from([n[0]]), [], SelectionMode::Direct, Some(root));
        assert_eq!(next, BTreeSet::from([root]));
        let cleared = resolve_selection(&BTreeSet::from([n[0]]), [n[0]], SelectionMode::Toggle, Some(root));
        assert_eq!(cleared, BTreeSet::from([root]));
        assert!(resolve_selection(&BTreeSet::new(), [], SelectionMode::Direct, None).is_empty());
    }

    #[test]
    fn duplicate_hits_count_once() {
        let n = ids(1);
        let next = resolve_selection(&BTreeSet::new(), [n[0], n[0]], SelectionMode::Toggle, None);
        assert_eq!(next, BTreeSet::from([n[0]]));
    }

    #[test]
    fn op_seqs_are_unique() {
        assert_ne!(OpSeq::new(), OpSeq::new());
    }
}
