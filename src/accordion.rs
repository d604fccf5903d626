/// One sibling scope of collapsible sections: at most one is expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccordionScope {
    expanded: Option<usize>,
}

impl AccordionScope {
    /// Collapse every other section of the scope, then flip `index`.
    pub fn activate(&mut self, index: usize) {
        self.expanded = match self.expanded {
            Some(open) if open == index => None,
            _ => Some(index),
        };
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded == Some(index)
    }
}

/// Two-level accordion: platform groups, then the families of each group.
///
/// Each group owns its own family scope, so collapsing or hiding a group
/// keeps whichever family inside it was open.
#[derive(Debug, Clone, Default)]
pub struct Accordion {
    groups: AccordionScope,
    families: Vec<AccordionScope>,
}

impl Accordion {
    pub fn new(group_count: usize) -> Self {
        Self {
            groups: AccordionScope::default(),
            families: vec![AccordionScope::default(); group_count],
        }
    }

    pub fn toggle_group(&mut self, group: usize) {
        if group < self.families.len() {
            self.groups.activate(group);
        }
    }

    pub fn toggle_family(&mut self, group: usize, family: usize) {
        if let Some(scope) = self.families.get_mut(group) {
            scope.activate(family);
        }
    }

    pub fn group_expanded(&self, group: usize) -> bool {
        self.groups.is_expanded(group)
    }

    pub fn family_expanded(&self, group: usize, family: usize) -> bool {
        self.families
            .get(group)
            .is_some_and(|scope| scope.is_expanded(family))
    }
}
