use log::{info, warn};

use crate::process::memory::{Region, RegionName, SizeField};

/// Size and Rss in kB.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub size: u64,
    pub rss: u64,
}

impl Usage {
    pub fn of(region: &Region) -> Self {
        Self {
            size: region.size_kb(),
            rss: region.rss_kb(),
        }
    }

    // Saturates rather than wrapping on absurd kB values.
    fn add(&mut self, other: Usage) {
        self.size = self.size.saturating_add(other.size);
        self.rss = self.rss.saturating_add(other.rss);
    }
}

impl<'a> FromIterator<&'a Region> for Usage {
    fn from_iter<I: IntoIterator<Item = &'a Region>>(iter: I) -> Self {
        let mut total = Usage::default();
        for region in iter {
            total.add(Usage::of(region));
        }
        total
    }
}

/// Narrows the library list. `include` is applied first, then `exclude`.
#[derive(Debug, Default, Clone)]
pub struct LibraryFilter {
    pub include: Option<String>,
    pub exclude: Option<String>,
}

impl LibraryFilter {
    pub fn new(include: Option<String>, exclude: Option<String>) -> Self {
        // An empty string filters nothing.
        Self {
            include: include.filter(|s| !s.is_empty()),
            exclude: exclude.filter(|s| !s.is_empty()),
        }
    }

    pub fn keeps(&self, name: &str) -> bool {
        let included = self.include.as_deref().is_none_or(|text| name.contains(text));
        let excluded = self.exclude.as_deref().is_some_and(|text| name.contains(text));
        included && !excluded
    }
}

/// A named region that survived the filter. Sizes stay `None` when unreported.
pub struct Library<'a> {
    pub name: &'a str,
    pub size: Option<u64>,
    pub rss: Option<u64>,
}

impl Library<'_> {
    fn usage(&self) -> Usage {
        Usage {
            size: self.size.unwrap_or(0),
            rss: self.rss.unwrap_or(0),
        }
    }
}

/// Category totals for one parsed report.
pub struct Summary<'a> {
    pub regions: &'a [Region],
    /// Unnamed regions plus the stack and the heap.
    pub anonymous: Usage,
    pub stack: Option<Usage>,
    pub heap: Option<Usage>,
    pub libraries: Usage,
    pub library_list: Vec<Library<'a>>,
    pub executable_name: Option<&'a str>,
    pub executable: Usage,
    pub total: Usage,
}

impl<'a> Summary<'a> {
    pub fn aggregate(regions: &'a [Region], filter: &LibraryFilter) -> Self {
        let stack = find_pseudo(regions, RegionName::Stack);
        let heap = find_pseudo(regions, RegionName::Heap);

        let mut anonymous: Usage = regions.iter().filter(|r| r.is_anonymous()).collect();
        for pseudo in [stack, heap].into_iter().flatten() {
            anonymous.add(pseudo);
        }

        // Stack and heap already count as anonymous.
        let library_list: Vec<Library<'a>> = regions
            .iter()
            .filter(|r| !matches!(r.kind(), RegionName::Stack | RegionName::Heap))
            .filter_map(|r| r.name.as_deref().map(|name| (name, r)))
            .filter(|(name, _)| filter.keeps(name))
            .map(|(name, r)| Library {
                name,
                size: r.size(SizeField::Size),
                rss: r.size(SizeField::Rss),
            })
            .collect();
        let mut libraries = Usage::default();
        for library in &library_list {
            libraries.add(library.usage());
        }

        // The first stanza is taken to belong to the main executable.
        let executable_name = regions.first().and_then(|r| r.name.as_deref());
        let executable: Usage = match executable_name {
            Some(name) => {
                info!("executable: {name}");
                regions.iter().filter(|r| r.is_named(name)).collect()
            }
            None => Usage::default(),
        };

        Self {
            regions,
            anonymous,
            stack,
            heap,
            libraries,
            library_list,
            executable_name,
            executable,
            total: regions.iter().collect(),
        }
    }
}

fn find_pseudo(regions: &[Region], kind: RegionName) -> Option<Usage> {
    let found = regions.iter().find(|r| r.kind() == kind).map(Usage::of);
    if found.is_none() {
        warn!("no {kind} region in report");
    }
    found
}
