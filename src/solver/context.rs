use im::{HashMap, HashSet};

use crate::{
    error::ProtocolError,
    solver::{constraint::Assignment, engine::VariableId, value::ValueEquality},
};

/// The current partial assignment to a variable's separator — the ancestors
/// whose values its local cost functions depend on.
///
/// Built incrementally: each VALUE / VALUE_FIN message augments the context
/// with the sender's reported pairs, filtered down to the separator. The
/// context is append-only in the protocol sense: an entry marked final (by a
/// VALUE_FIN) is never overwritten; attempting to change it is a protocol
/// violation.
#[derive(Debug, Clone)]
pub struct Context<V: ValueEquality> {
    entries: HashMap<VariableId, ContextEntry<V>>,
    separator: HashSet<VariableId>,
}

#[derive(Debug, Clone)]
struct ContextEntry<V> {
    value: V,
    finalised: bool,
}

impl<V: ValueEquality> Context<V> {
    pub fn new(separator: HashSet<VariableId>) -> Self {
        Self {
            entries: HashMap::new(),
            separator,
        }
    }

    /// An empty context over an empty separator — the root's context.
    pub fn empty() -> Self {
        Self::new(HashSet::new())
    }

    pub fn separator(&self) -> &HashSet<VariableId> {
        &self.separator
    }

    pub fn get(&self, variable: VariableId) -> Option<&V> {
        self.entries.get(&variable).map(|entry| &entry.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges the reported pairs into the context, keeping only the ones in
    /// this variable's separator. Returns `true` if any entry changed value
    /// or appeared for the first time.
    ///
    /// With `finalise` set (a VALUE_FIN), every merged entry is marked
    /// final. Overwriting a finalised entry with a different value is a
    /// protocol violation.
    pub fn merge(
        &mut self,
        pairs: &[(VariableId, V)],
        finalise: bool,
    ) -> Result<bool, ProtocolError> {
        let mut changed = false;
        for (variable, value) in pairs {
            if !self.separator.contains(variable) {
                continue;
            }

            match self.entries.get_mut(variable) {
                Some(entry) => {
                    if entry.value != *value {
                        if entry.finalised {
                            return Err(ProtocolError::FinalContextOverwrite(*variable));
                        }
                        entry.value = value.clone();
                        changed = true;
                    }
                    entry.finalised |= finalise;
                }
                None => {
                    self.entries.insert(
                        *variable,
                        ContextEntry {
                            value: value.clone(),
                            finalised: finalise,
                        },
                    );
                    changed = true;
                }
            }
        }
        Ok(changed)
    }

    /// Whether every separator variable has a value.
    pub fn covers_separator(&self) -> bool {
        self.separator
            .iter()
            .all(|variable| self.entries.contains_key(variable))
    }

    /// The context as a plain assignment, for cost-function evaluation.
    pub fn assignment(&self) -> Assignment<V> {
        self.entries
            .iter()
            .map(|(variable, entry)| (*variable, entry.value.clone()))
            .collect()
    }

    /// The context pairs to forward down the tree, extended with this
    /// variable's own candidate value.
    pub fn pairs_with(&self, variable: VariableId, value: V) -> Vec<(VariableId, V)> {
        let mut pairs: Vec<(VariableId, V)> = self
            .entries
            .iter()
            .map(|(id, entry)| (*id, entry.value.clone()))
            .collect();
        pairs.sort_by_key(|(id, _)| *id);
        pairs.push((variable, value));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn separator(ids: &[VariableId]) -> HashSet<VariableId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn merge_filters_to_the_separator() {
        let mut context = Context::new(separator(&[0, 1]));
        let changed = context
            .merge(&[(0, 'a'), (1, 'b'), (7, 'z')], false)
            .unwrap();

        assert!(changed);
        assert_eq!(context.get(0), Some(&'a'));
        assert_eq!(context.get(1), Some(&'b'));
        assert_eq!(context.get(7), None);
        assert!(context.covers_separator());
    }

    #[test]
    fn non_final_entries_can_be_revised() {
        let mut context = Context::new(separator(&[0]));
        context.merge(&[(0, 'a')], false).unwrap();
        let changed = context.merge(&[(0, 'b')], false).unwrap();

        assert!(changed);
        assert_eq!(context.get(0), Some(&'b'));
    }

    #[test]
    fn remerging_the_same_value_reports_no_change() {
        let mut context = Context::new(separator(&[0]));
        context.merge(&[(0, 'a')], false).unwrap();
        let changed = context.merge(&[(0, 'a')], false).unwrap();

        assert!(!changed);
    }

    #[test]
    fn finalised_entries_are_never_overwritten() {
        let mut context = Context::new(separator(&[0]));
        context.merge(&[(0, 'a')], true).unwrap();

        // Same value again is fine, final or not.
        assert!(!context.merge(&[(0, 'a')], false).unwrap());

        let err = context.merge(&[(0, 'b')], false).unwrap_err();
        assert!(matches!(err, ProtocolError::FinalContextOverwrite(0)));
        assert_eq!(context.get(0), Some(&'a'));
    }

    #[test]
    fn pairs_with_appends_own_value_in_stable_order() {
        let mut context = Context::new(separator(&[2, 5]));
        context.merge(&[(5, 'b'), (2, 'a')], false).unwrap();

        let pairs = context.pairs_with(9, 'c');
        assert_eq!(pairs, vec![(2, 'a'), (5, 'b'), (9, 'c')]);
    }
}
