use crate::accordion::Accordion;
use crate::catalog::{self, Catalog, PlatformGroup, RomVersion};
use crate::filter::{Filter, FilterBar};
use crate::render::{self, DownloadLink};
use crate::theme::ThemeController;
use wildmatch::WildMatch;

/// Input mode for the search bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Owned copy of one family bucket, kept for the lifetime of the app.
#[derive(Debug, Clone)]
pub struct FamilyView {
    pub family: String,
    pub versions: Vec<RomVersion>,
}

/// Owned copy of one platform group.
#[derive(Debug, Clone)]
pub struct GroupView {
    pub platform_version: String,
    pub families: Vec<FamilyView>,
}

impl From<&PlatformGroup<'_>> for GroupView {
    fn from(group: &PlatformGroup<'_>) -> Self {
        Self {
            platform_version: group.platform_version.to_string(),
            families: group
                .families
                .iter()
                .map(|f| FamilyView {
                    family: f.family.to_string(),
                    versions: f.versions.iter().map(|v| (*v).clone()).collect(),
                })
                .collect(),
        }
    }
}

/// One visible line of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Group(usize),
    Family(usize, usize),
    Version(usize, usize, usize),
}

pub const LIST_OVERHEAD: u16 = 12;

/// Main application state.
pub struct App {
    pub should_quit: bool,
    pub show_help: bool,

    pub groups: Vec<GroupView>,
    pub total_entries: usize,

    pub accordion: Accordion,
    pub filters: FilterBar,
    pub theme: ThemeController,

    pub search: String,
    pub input_mode: InputMode,

    // Tree view state
    pub rows: Vec<Row>,
    pub selected: usize,
    pub page_size: usize,

    // Index into the selected version's flattened links
    pub link_selected: usize,

    pub status_msg: String,
}

impl App {
    pub fn new(catalog: &Catalog, theme: ThemeController, initial_filter: &Filter) -> Self {
        let groups: Vec<GroupView> = catalog::group_by_platform_version(catalog)
            .iter()
            .map(GroupView::from)
            .collect();
        let mut filters = FilterBar::new(groups.iter().map(|g| g.platform_version.as_str()));
        if !filters.activate_value(initial_filter.value()) {
            log::warn!(
                "no platform group {:?}; showing all",
                initial_filter.value()
            );
        }

        let mut app = Self {
            should_quit: false,
            show_help: false,
            accordion: Accordion::new(groups.len()),
            total_entries: catalog::count_entries(catalog),
            groups,
            filters,
            theme,
            search: String::new(),
            input_mode: InputMode::Normal,
            rows: Vec::new(),
            selected: 0,
            page_size: 20, // Initial default, will be updated on first render/resize
            link_selected: 0,
            status_msg: String::new(),
        };
        app.rebuild_rows(None);
        app.status_msg = catalog::counter_label(app.total_entries);
        app
    }

    pub fn counter_text(&self) -> String {
        catalog::counter_label(self.total_entries)
    }

    fn search_matcher(&self) -> Option<WildMatch> {
        let query = self.search.trim().to_lowercase();
        if query.is_empty() {
            None
        } else if query.contains('*') || query.contains('?') {
            Some(WildMatch::new(&query))
        } else {
            Some(WildMatch::new(&format!("*{query}*")))
        }
    }

    /// Families of group `gi` that pass the search bar.
    pub fn matching_families(&self, gi: usize) -> Vec<usize> {
        let matcher = self.search_matcher();
        self.groups[gi]
            .families
            .iter()
            .enumerate()
            .filter(|(_, f)| {
                matcher.as_ref().is_none_or(|m| {
                    m.matches(&f.family.to_lowercase())
                        || f.versions.iter().any(|v| m.matches(&v.name.to_lowercase()))
                })
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of the groups shown under the active filter button.
    pub fn visible_groups(&self) -> Vec<usize> {
        self.filters
            .visible(self.groups.iter().map(|g| g.platform_version.as_str()))
    }

    /// Recompute visible rows, keeping `keep` selected when it is still shown.
    fn rebuild_rows(&mut self, keep: Option<Row>) {
        let searching = !self.search.trim().is_empty();
        let mut rows = Vec::new();
        for gi in self.visible_groups() {
            let families = self.matching_families(gi);
            if searching && families.is_empty() {
                continue;
            }
            rows.push(Row::Group(gi));
            if !self.accordion.group_expanded(gi) {
                continue;
            }
            for fi in families {
                rows.push(Row::Family(gi, fi));
                if self.accordion.family_expanded(gi, fi) {
                    let count = self.groups[gi].families[fi].versions.len();
                    rows.extend((0..count).map(|vi| Row::Version(gi, fi, vi)));
                }
            }
        }
        self.rows = rows;

        self.selected = keep
            .and_then(|row| self.rows.iter().position(|r| *r == row))
            .unwrap_or_else(|| self.selected.min(self.rows.len().saturating_sub(1)));
    }

    pub fn selected_row(&self) -> Option<Row> {
        self.rows.get(self.selected).copied()
    }

    pub fn selected_version(&self) -> Option<&RomVersion> {
        match self.selected_row()? {
            Row::Version(gi, fi, vi) => self.groups[gi].families[fi].versions.get(vi),
            _ => None,
        }
    }

    pub fn selected_links(&self) -> Vec<DownloadLink<'_>> {
        self.selected_version()
            .map(render::download_links)
            .unwrap_or_default()
    }

    pub fn selected_link(&self) -> Option<DownloadLink<'_>> {
        self.selected_links().into_iter().nth(self.link_selected)
    }

    /// Update page size based on terminal height.
    pub fn update_page_size(&mut self, terminal_height: u16) {
        let new_size = terminal_height.saturating_sub(LIST_OVERHEAD) as usize;
        self.page_size = new_size.max(1);
    }

    fn select(&mut self, index: usize) {
        let index = index.min(self.rows.len().saturating_sub(1));
        if index != self.selected {
            self.link_selected = 0;
        }
        self.selected = index;
    }

    pub fn list_next(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.select(self.selected + 1);
        }
    }

    pub fn list_prev(&mut self) {
        self.select(self.selected.saturating_sub(1));
    }

    pub fn list_page_down(&mut self) {
        self.select(self.selected + self.page_size);
    }

    pub fn list_page_up(&mut self) {
        self.select(self.selected.saturating_sub(self.page_size));
    }

    pub fn list_first(&mut self) {
        self.select(0);
    }

    pub fn list_last(&mut self) {
        self.select(self.rows.len().saturating_sub(1));
    }

    /// Activate the header under the cursor (accordion toggle).
    pub fn toggle_expand(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        match row {
            Row::Group(gi) => self.accordion.toggle_group(gi),
            Row::Family(gi, fi) => self.accordion.toggle_family(gi, fi),
            Row::Version(..) => return,
        }
        self.rebuild_rows(Some(row));
    }

    fn filter_changed(&mut self) {
        let keep = self.selected_row();
        self.rebuild_rows(keep);
        self.link_selected = 0;
        self.status_msg = format!(
            "{} groups shown for \"{}\"",
            self.visible_groups().len(),
            self.filters.current().value()
        );
    }

    pub fn filter_next(&mut self) {
        self.filters.next();
        self.filter_changed();
    }

    pub fn filter_prev(&mut self) {
        self.filters.prev();
        self.filter_changed();
    }

    pub fn filter_activate(&mut self, index: usize) {
        if index < self.filters.buttons().len() {
            self.filters.activate(index);
            self.filter_changed();
        }
    }

    /// Re-apply the search bar.
    pub fn apply_search(&mut self) {
        let keep = self.selected_row();
        self.rebuild_rows(keep);
        self.status_msg = if self.search.is_empty() {
            self.counter_text()
        } else {
            format!("{} rows match \"{}\"", self.rows.len(), self.search)
        };
    }

    pub fn link_next(&mut self) {
        let count = self.selected_links().len();
        if count > 0 {
            self.link_selected = (self.link_selected + 1) % count;
        }
    }

    pub fn toggle_theme(&mut self) {
        match self.theme.toggle() {
            Ok(theme) => self.status_msg = format!("Theme: {}", theme.as_str()),
            Err(e) => {
                log::error!("could not save theme: {e}");
                self.status_msg = format!(
                    "Theme: {} (not saved: {e})",
                    self.theme.theme().as_str()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample;
    use crate::theme::{PreferenceStore, Theme};

    fn app_with(filter: &Filter) -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("preferences.json"));
        let app = App::new(&sample(), ThemeController::load(store), filter);
        (app, dir)
    }

    #[test]
    fn test_initial_rows_collapsed() {
        let (app, _dir) = app_with(&Filter::All);
        assert_eq!(app.rows, vec![Row::Group(0), Row::Group(1)]);
        assert_eq!(app.counter_text(), "6 прошивок");
        assert_eq!(app.groups[0].platform_version, "14");
    }

    #[test]
    fn test_expand_group_and_family() {
        let (mut app, _dir) = app_with(&Filter::All);
        app.toggle_expand();
        assert_eq!(
            app.rows,
            vec![Row::Group(0), Row::Family(0, 0), Row::Family(0, 1), Row::Group(1)]
        );
        app.list_next();
        app.toggle_expand();
        assert_eq!(app.rows.len(), 6);
        assert_eq!(app.selected_row(), Some(Row::Family(0, 0)));

        app.list_next();
        assert_eq!(app.selected_version().map(|v| v.name.as_str()), Some("21.0-20240101"));
    }

    #[test]
    fn test_opening_group_collapses_sibling() {
        let (mut app, _dir) = app_with(&Filter::All);
        app.toggle_expand();
        app.list_last();
        assert_eq!(app.selected_row(), Some(Row::Group(1)));
        app.toggle_expand();
        assert_eq!(
            app.rows,
            vec![Row::Group(0), Row::Group(1), Row::Family(1, 0)]
        );
        assert_eq!(app.selected_row(), Some(Row::Group(1)));
    }

    #[test]
    fn test_filter_keeps_accordion_state() {
        let (mut app, _dir) = app_with(&Filter::All);
        app.toggle_expand();
        app.filter_activate(2);
        assert_eq!(app.rows, vec![Row::Group(1)]);
        app.filter_activate(0);
        assert!(app.accordion.group_expanded(0));
        assert_eq!(app.rows.len(), 4);
    }

    #[test]
    fn test_initial_filter_from_settings() {
        let (app, _dir) = app_with(&Filter::Platform("13".to_string()));
        assert_eq!(app.rows, vec![Row::Group(1)]);
        let (app, _dir) = app_with(&Filter::Platform("7".to_string()));
        assert_eq!(app.rows.len(), 2);
    }

    #[test]
    fn test_search_narrows_families() {
        let (mut app, _dir) = app_with(&Filter::All);
        app.search = "pixel".to_string();
        app.apply_search();
        assert_eq!(app.rows, vec![Row::Group(0)]);
        app.toggle_expand();
        assert_eq!(app.rows, vec![Row::Group(0), Row::Family(0, 1)]);

        app.search = "9.*".to_string();
        app.apply_search();
        assert_eq!(app.rows, vec![Row::Group(1)]);
    }

    #[test]
    fn test_theme_toggle_updates_status() {
        let (mut app, _dir) = app_with(&Filter::All);
        app.toggle_theme();
        assert_eq!(app.theme.theme(), Theme::Light);
        assert_eq!(app.status_msg, "Theme: light");
    }
}
