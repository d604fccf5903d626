/// Filter value that shows every platform group.
pub const ALL: &str = "all";

/// Active platform-version filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Platform(String),
}

impl Filter {
    /// Parse a button value; `"all"` is the only reserved word.
    pub fn from_value(value: &str) -> Self {
        if value == ALL {
            Filter::All
        } else {
            Filter::Platform(value.to_string())
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Filter::All => ALL,
            Filter::Platform(v) => v,
        }
    }

    /// Whether a group tagged with `platform_version` is shown.
    pub fn shows(&self, platform_version: &str) -> bool {
        match self {
            Filter::All => true,
            Filter::Platform(v) => v == platform_version,
        }
    }
}

/// Row of filter buttons; exactly one is active at any time.
#[derive(Debug, Clone)]
pub struct FilterBar {
    buttons: Vec<Filter>,
    active: usize,
}

impl FilterBar {
    /// `all` first, then one button per platform version in display order.
    pub fn new<'a>(platform_versions: impl IntoIterator<Item = &'a str>) -> Self {
        let mut buttons = vec![Filter::All];
        buttons.extend(platform_versions.into_iter().map(Filter::from_value));
        Self { buttons, active: 0 }
    }

    pub fn buttons(&self) -> &[Filter] {
        &self.buttons
    }

    pub fn current(&self) -> &Filter {
        &self.buttons[self.active]
    }

    pub fn is_active(&self, index: usize) -> bool {
        index == self.active
    }

    /// Mark button `index` active. Out-of-range indices are ignored.
    pub fn activate(&mut self, index: usize) -> &Filter {
        if index < self.buttons.len() {
            self.active = index;
        }
        self.current()
    }

    /// Activate the button carrying `value`, as if it had been clicked.
    /// Returns `false` when no such button exists.
    pub fn activate_value(&mut self, value: &str) -> bool {
        match self.buttons.iter().position(|b| b.value() == value) {
            Some(i) => {
                self.active = i;
                true
            }
            None => false,
        }
    }

    pub fn next(&mut self) -> &Filter {
        self.active = (self.active + 1) % self.buttons.len();
        self.current()
    }

    pub fn prev(&mut self) -> &Filter {
        self.active = (self.active + self.buttons.len() - 1) % self.buttons.len();
        self.current()
    }

    /// Indices of the groups visible under the active filter.
    pub fn visible<'a>(&self, platform_versions: impl IntoIterator<Item = &'a str>) -> Vec<usize> {
        let filter = self.current();
        platform_versions
            .into_iter()
            .enumerate()
            .filter(|(_, pv)| filter.shows(pv))
            .map(|(i, _)| i)
            .collect()
    }
}
