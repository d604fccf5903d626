//! Markup rendering of the grouped catalog.
//!
//! The tree built here mirrors the accordion layout used by the terminal view:
//! platform group → family → version card → download links. `render_page`
//! wraps it into a standalone HTML document.

use crate::catalog::{
    self, Catalog, FamilyBucket, PlatformGroup, RomVersion, counter_label, families_label,
    versions_label,
};
use crate::filter::ALL;
use crate::theme::Theme;
use std::fmt::Write;

/// A download entry after flattening direct and variant links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink<'a> {
    pub label: String,
    pub url: &'a str,
}

/// Direct links first, then every variant link labelled `"<name> (<type>)"`.
pub fn download_links(version: &RomVersion) -> Vec<DownloadLink<'_>> {
    let direct = version.links.iter().map(|link| DownloadLink {
        label: link.name.clone(),
        url: &link.url,
    });
    let variants = version.variants.iter().flat_map(|variant| {
        variant.links.iter().map(move |link| DownloadLink {
            label: format!("{} ({})", link.name, variant.kind),
            url: &link.url,
        })
    });
    direct.chain(variants).collect()
}

/// Minimal element tree; enough for the page and easy to assert on in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element {
        tag: &'static str,
        attrs: Vec<(&'static str, String)>,
        children: Vec<Node>,
    },
    Text(String),
    /// Trusted markup emitted verbatim (stylesheet, script).
    Raw(String),
}

impl Node {
    pub fn el(tag: &'static str) -> Self {
        Node::Element {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Node::Text(s.into())
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        if let Node::Element { attrs, .. } = &mut self {
            attrs.push((name, value.into()));
        }
        self
    }

    pub fn class(self, value: &str) -> Self {
        self.attr("class", value)
    }

    pub fn child(mut self, node: Node) -> Self {
        if let Node::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        if let Node::Element { children, .. } = &mut self {
            children.extend(nodes);
        }
        self
    }

    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(4096);
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(s) => out.push_str(&escape(s)),
            Node::Raw(s) => out.push_str(s),
            Node::Element {
                tag,
                attrs,
                children,
            } => {
                let _ = write!(out, "<{tag}");
                for (k, v) in attrs {
                    let _ = write!(out, " {k}=\"{}\"", escape(v));
                }
                out.push('>');
                if is_void(tag) {
                    return;
                }
                for c in children {
                    c.write_html(out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

#[cfg(test)]
impl Node {
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    /// Depth-first search for every element carrying `class`.
    pub fn find_by_class<'n>(&'n self, class: &str) -> Vec<&'n Node> {
        let mut out = Vec::new();
        self.collect_class(class, &mut out);
        out
    }

    fn collect_class<'n>(&'n self, class: &str, out: &mut Vec<&'n Node>) {
        if self.has_class(class) {
            out.push(self);
        }
        if let Node::Element { children, .. } = self {
            for c in children {
                c.collect_class(class, out);
            }
        }
    }

    /// Text content of all descendants, joined by single spaces.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(s) => s.clone(),
            Node::Raw(_) => String::new(),
            Node::Element { children, .. } => children
                .iter()
                .map(Node::text_content)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "meta" | "br" | "link" | "img" | "input")
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn icon(class: &str) -> Node {
    Node::el("i").class(class)
}

fn header(class: &str, level: &'static str, icon_class: &str, title: String, count_class: &str, count: String) -> Node {
    Node::el("div")
        .class(class)
        .attr("role", "button")
        .child(Node::el(level).child(icon(icon_class)).child(Node::text(title)))
        .child(Node::el("span").class(count_class).child(Node::text(count)))
}

pub fn render_version(version: &RomVersion) -> Node {
    let mut head = Node::el("div").class("rom-header").child(
        Node::el("h5")
            .child(icon("fas fa-code-branch"))
            .child(Node::text(&version.name)),
    );
    if let Some(date) = &version.date {
        head = head.child(Node::el("span").class("rom-date").child(Node::text(date)));
    }

    let links = download_links(version).into_iter().map(|link| {
        Node::el("a")
            .attr("href", link.url)
            .attr("target", "_blank")
            .class("download-btn")
            .child(icon("fas fa-download"))
            .child(Node::text(link.label))
    });

    Node::el("div")
        .class("rom-card")
        .child(head)
        .child(Node::el("div").class("download-links").children(links))
}

pub fn render_family(bucket: &FamilyBucket<'_>) -> Node {
    Node::el("div")
        .class("family-group")
        .child(header(
            "family-header",
            "h4",
            "fas fa-folder",
            bucket.family.to_string(),
            "version-count",
            versions_label(bucket.versions.len()),
        ))
        .child(
            Node::el("div")
                .class("family-content")
                .children(bucket.versions.iter().map(|v| render_version(v))),
        )
}

pub fn render_group(group: &PlatformGroup<'_>) -> Node {
    Node::el("div")
        .class("android-group")
        .attr("data-android", group.platform_version)
        .child(header(
            "android-header",
            "h3",
            "fab fa-android",
            format!("Android {}", group.platform_version),
            "rom-count",
            families_label(group.families.len()),
        ))
        .child(
            Node::el("div")
                .class("android-content")
                .children(group.families.iter().map(render_family)),
        )
}

/// The results container, rebuilt from scratch on every call.
pub fn render_catalog(groups: &[PlatformGroup<'_>]) -> Node {
    Node::el("div")
        .attr("id", "romsContainer")
        .class("roms-container")
        .children(groups.iter().map(render_group))
}

/// Replacement for the loading indicator when the catalog cannot be loaded.
pub fn render_load_failure(detail: &str) -> Node {
    Node::el("div")
        .attr("id", "loading")
        .class("loading load-failure")
        .child(icon("fas fa-exclamation-triangle"))
        .child(Node::el("p").child(Node::text("Не удалось загрузить список прошивок")))
        .child(Node::el("p").class("load-failure-detail").child(Node::text(detail)))
}

fn filter_bar(groups: &[PlatformGroup<'_>]) -> Node {
    let all = Node::el("button")
        .class("filter-btn active")
        .attr("data-filter", ALL)
        .child(Node::text("Все"));
    let buttons = groups.iter().map(|g| {
        Node::el("button")
            .class("filter-btn")
            .attr("data-filter", g.platform_version)
            .child(Node::text(format!("Android {}", g.platform_version)))
    });
    Node::el("div")
        .class("filters")
        .child(all)
        .children(buttons)
}

const STYLE: &str = r#"<style>
:root{--bg:#0f172a;--card:#1e293b;--border:#334155;--text:#e2e8f0;--dim:#94a3b8;--accent:#22c55e}
[data-theme="light"]{--bg:#f8fafc;--card:#ffffff;--border:#cbd5e1;--text:#0f172a;--dim:#475569;--accent:#16a34a}
body{margin:0;font-family:system-ui,sans-serif;background:var(--bg);color:var(--text)}
.container{max-width:960px;margin:0 auto;padding:1.5rem}
.topbar{display:flex;justify-content:space-between;align-items:center}
.filters{display:flex;flex-wrap:wrap;gap:.5rem;margin:1rem 0}
.filter-btn{background:var(--card);color:var(--text);border:1px solid var(--border);border-radius:8px;padding:.4rem .8rem;cursor:pointer}
.filter-btn.active{border-color:var(--accent);color:var(--accent)}
.android-group,.family-group,.rom-card{background:var(--card);border:1px solid var(--border);border-radius:10px;margin:.5rem 0}
.android-header,.family-header{display:flex;justify-content:space-between;align-items:center;padding:.6rem 1rem;cursor:pointer}
.android-content,.family-content{display:none;padding:0 1rem .6rem}
.rom-header{display:flex;justify-content:space-between;padding:.4rem .8rem}
.rom-date,.rom-count,.version-count{color:var(--dim)}
.download-links{display:flex;flex-wrap:wrap;gap:.4rem;padding:0 .8rem .6rem}
.download-btn{color:var(--accent);text-decoration:none;border:1px solid var(--border);border-radius:6px;padding:.25rem .6rem}
.load-failure{color:#ef4444;text-align:center}
</style>"#;

const SCRIPT: &str = r#"<script>
(function(){
  var root=document.documentElement;
  var saved=localStorage.getItem('theme');
  if(saved){root.setAttribute('data-theme',saved);}
  document.getElementById('themeToggle').addEventListener('click',function(){
    var next=root.getAttribute('data-theme')==='dark'?'light':'dark';
    root.setAttribute('data-theme',next);
    localStorage.setItem('theme',next);
  });
  function accordion(headerSel,contentSel,scopeSel){
    document.querySelectorAll(headerSel).forEach(function(h){
      h.addEventListener('click',function(){
        var content=h.nextElementSibling;
        var open=content.style.display==='block';
        var scope=h.parentElement.closest(scopeSel)||document;
        scope.querySelectorAll(contentSel).forEach(function(c){if(c!==content){c.style.display='none';}});
        content.style.display=open?'none':'block';
      });
    });
  }
  accordion('.android-header','.android-content','.roms-container');
  accordion('.family-header','.family-content','.android-content');
  var buttons=document.querySelectorAll('.filter-btn');
  buttons.forEach(function(b){
    b.addEventListener('click',function(){
      buttons.forEach(function(x){x.classList.remove('active');});
      b.classList.add('active');
      var f=b.dataset.filter;
      document.querySelectorAll('.android-group').forEach(function(g){
        g.style.display=(f==='all'||g.dataset.android===f)?'block':'none';
      });
    });
  });
})();
</script>"#;

/// Standalone page: top bar with counter and theme toggle, filter buttons,
/// the results container, and the embedded controllers.
pub fn render_page(catalog: &Catalog, theme: Theme) -> String {
    let groups = catalog::group_by_platform_version(catalog);
    let total = catalog::count_entries(catalog);

    let topbar = Node::el("div")
        .class("topbar")
        .child(Node::el("h1").child(Node::text("ROM Catalog")))
        .child(
            Node::el("span")
                .attr("id", "romCounter")
                .class("rom-counter")
                .child(Node::text(counter_label(total))),
        )
        .child(
            Node::el("button")
                .attr("id", "themeToggle")
                .class("theme-toggle")
                .child(Node::text("◐")),
        );

    let body = Node::el("body").child(
        Node::el("div")
            .class("container")
            .child(topbar)
            .child(filter_bar(&groups))
            .child(
                Node::el("div")
                    .attr("id", "loading")
                    .class("loading")
                    .attr("style", "display:none"),
            )
            .child(render_catalog(&groups)),
    );

    let document = Node::el("html")
        .attr("lang", "ru")
        .attr("data-theme", theme.as_str())
        .child(
            Node::el("head")
                .child(Node::el("meta").attr("charset", "UTF-8"))
                .child(
                    Node::el("meta")
                        .attr("name", "viewport")
                        .attr("content", "width=device-width, initial-scale=1.0"),
                )
                .child(Node::el("title").child(Node::text("ROM Catalog")))
                .child(Node::Raw(STYLE.to_string())),
        )
        .child(body.child(Node::Raw(SCRIPT.to_string())));

    format!("<!DOCTYPE html>\n{}\n", document.to_html())
}

/// Page variant emitted when loading fails: same chrome, failure in place of
/// the loading indicator, no results.
pub fn render_failure_page(detail: &str, theme: Theme) -> String {
    let document = Node::el("html")
        .attr("lang", "ru")
        .attr("data-theme", theme.as_str())
        .child(
            Node::el("head")
                .child(Node::el("meta").attr("charset", "UTF-8"))
                .child(Node::el("title").child(Node::text("ROM Catalog")))
                .child(Node::Raw(STYLE.to_string())),
        )
        .child(
            Node::el("body").child(
                Node::el("div")
                    .class("container")
                    .child(render_load_failure(detail))
                    .child(Node::el("div").attr("id", "romsContainer")),
            ),
        );
    format!("<!DOCTYPE html>\n{}\n", document.to_html())
}
