use std::fmt;

use crate::app::units::Unit;
use crate::process::{
    Origin,
    memory::SizeField,
    summary::{Summary, Usage},
};

/// Output options threaded from the command line into the formatter.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportConfig {
    pub verbose: bool,
    pub unit: Unit,
}

pub struct App<'a> {
    config: ReportConfig,
    summary: Summary<'a>,
    origin: Option<&'a Origin>,
}

impl<'a> App<'a> {
    pub fn new(config: ReportConfig, summary: Summary<'a>) -> Self {
        Self {
            config,
            summary,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: &'a Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    fn write_pseudo(
        &self,
        out: &mut fmt::Formatter<'_>,
        label: &str,
        usage: Option<Usage>,
    ) -> fmt::Result {
        let unit = self.config.unit;
        match usage {
            Some(usage) => writeln!(
                out,
                " [{label}] Size: {} Rss: {}",
                unit.format(usage.size),
                unit.format(usage.rss)
            ),
            None => writeln!(out, " [{label}] not present in report"),
        }
    }
}

impl fmt::Display for App<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.config.unit;
        let summary = &self.summary;

        writeln!(out)?;
        match self.origin {
            Some(Origin::Process { pid, cmd_line }) => writeln!(
                out,
                " [Process {}: {}]",
                pid,
                cmd_line.as_deref().unwrap_or("?")
            )?,
            Some(Origin::File(path)) => writeln!(out, " [File {}]", path.display())?,
            None => {}
        }

        writeln!(
            out,
            " [Anonymous Region, +Stack, +Heap Size] : {}",
            unit.format(summary.anonymous.size)
        )?;
        writeln!(
            out,
            " [Anonymous Region, +Stack, +Heap Rss] : {}",
            unit.format(summary.anonymous.rss)
        )?;

        if self.config.verbose {
            for region in summary.regions {
                writeln!(
                    out,
                    "\t{}-{} {} Size: {} Rss: {}",
                    region.start,
                    region.end,
                    region.permissions,
                    unit.format_field(region.size(SizeField::Size)),
                    unit.format_field(region.size(SizeField::Rss)),
                )?;
            }
        }

        self.write_pseudo(out, "Stack", summary.stack)?;
        self.write_pseudo(out, "Heap", summary.heap)?;

        writeln!(out, " [Library Size] : {}", unit.format(summary.libraries.size))?;
        writeln!(out, " [Library Rss] : {}", unit.format(summary.libraries.rss))?;

        if self.config.verbose {
            for library in &summary.library_list {
                writeln!(out, "\t{} : {}", library.name, unit.format_field(library.size))?;
                writeln!(out, "\t{} : {}", library.name, unit.format_field(library.rss))?;
            }
        }

        if let Some(name) = summary.executable_name {
            writeln!(out, " [Executable] : {name}")?;
        }
        writeln!(out, " [Executable Size] : {}", unit.format(summary.executable.size))?;
        writeln!(out, " [Executable Rss Size] : {}", unit.format(summary.executable.rss))?;

        writeln!(
            out,
            " [Total Size] : {} in {} regions",
            unit.format(summary.total.size),
            summary.regions.len()
        )?;
        writeln!(out, " [Total Rss] : {}", unit.format(summary.total.rss))?;
        writeln!(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{
        memory::{Region, RegionParser},
        summary::LibraryFilter,
    };

    const SCENARIO: &str = "\
01a4c000-01a6d000 rw-p 00000000 00:00 0        [heap]
Size:                100 kB
Rss:                  80 kB
7ffc00000000-7ffc00800000 rw-p 00000000 00:00 0        [stack]
Size:               8192 kB
Rss:                 200 kB
7f2000000000-7f2000100000 r-xp 00000000 08:02 42      /lib/libc.so
Size:               1500 kB
Rss:                 900 kB
7f1000000000-7f1000010000 rw-p 00000000 00:00 0
Size:                 50 kB
Rss:                  40 kB
";

    fn regions(report: &str) -> Vec<Region> {
        RegionParser::new().unwrap().parse(report).unwrap()
    }

    fn render(report: &str, config: ReportConfig, filter: LibraryFilter) -> String {
        let regions = regions(report);
        let summary = Summary::aggregate(&regions, &filter);
        App::new(config, summary).to_string()
    }

    #[test]
    fn test_end_to_end_totals() {
        let out = render(SCENARIO, ReportConfig::default(), LibraryFilter::default());

        assert!(out.contains(" [Anonymous Region, +Stack, +Heap Size] : 8342 kB\n"));
        assert!(out.contains(" [Anonymous Region, +Stack, +Heap Rss] : 320 kB\n"));
        assert!(out.contains(" [Stack] Size: 8192 kB Rss: 200 kB\n"));
        assert!(out.contains(" [Heap] Size: 100 kB Rss: 80 kB\n"));
        assert!(out.contains(" [Library Size] : 1500 kB\n"));
        assert!(out.contains(" [Library Rss] : 900 kB\n"));
        assert!(out.contains(" [Executable] : [heap]\n"));
        assert!(!out.contains('\t'));
    }

    #[test]
    fn test_end_to_end_match() {
        let report = format!(
            "{SCENARIO}\
7f3000000000-7f3000100000 r-xp 00000000 08:02 43      /lib/libm.so
Size:                300 kB
Rss:                 100 kB
"
        );
        let config = ReportConfig {
            verbose: true,
            unit: Unit::Kb,
        };
        let out = render(&report, config, LibraryFilter::new(Some("libc".to_string()), None));

        assert!(out.contains(" [Library Size] : 1500 kB\n"));
        assert!(out.contains(" [Library Rss] : 900 kB\n"));
        assert!(out.contains("\t/lib/libc.so : 1500 kB\n\t/lib/libc.so : 900 kB\n"));
        assert!(!out.contains("\t/lib/libm.so"));
    }

    #[test]
    fn test_end_to_end_megabytes() {
        let report = "\
7f2000000000-7f2000200000 r-xp 00000000 08:02 42      /lib/libc.so
Size:               2048 kB
Rss:                1024 kB
";
        let config = ReportConfig {
            verbose: false,
            unit: Unit::Mb,
        };
        let out = render(report, config, LibraryFilter::default());

        assert!(out.contains(" [Library Size] : 2.00 MB\n"));
        assert!(out.contains(" [Library Rss] : 1.00 MB\n"));
        assert!(out.contains(" [Executable Size] : 2.00 MB\n"));
    }

    #[test]
    fn test_missing_pseudo_regions_are_labelled() {
        let report = "\
7f2000000000-7f2000100000 r-xp 00000000 08:02 42      /lib/libc.so
Size:               1500 kB
";
        let out = render(report, ReportConfig::default(), LibraryFilter::default());

        assert!(out.contains(" [Stack] not present in report\n"));
        assert!(out.contains(" [Heap] not present in report\n"));
        assert!(out.contains(" [Anonymous Region, +Stack, +Heap Size] : 0 kB\n"));
    }

    #[test]
    fn test_verbose_marks_absent_rss() {
        let report = "\
7f1000000000-7f1000010000 rw-p 00000000 00:00 0
Size:                 50 kB
";
        let config = ReportConfig {
            verbose: true,
            unit: Unit::Kb,
        };
        let out = render(report, config, LibraryFilter::default());

        assert!(out.contains("\t7f1000000000-7f1000010000 rw-p Size: 50 kB Rss: n/a\n"));
        assert!(out.contains(" [Anonymous Region, +Stack, +Heap Rss] : 0 kB\n"));
        assert!(!out.contains(" [Executable] :"));
    }

    #[test]
    fn test_verbose_library_marks_absent_rss() {
        let report = "\
7f2000000000-7f2000100000 r-xp 00000000 08:02 42      /lib/libc.so
Size:               1500 kB
";
        let config = ReportConfig {
            verbose: true,
            unit: Unit::Kb,
        };
        let out = render(report, config, LibraryFilter::default());

        assert!(out.contains("\t/lib/libc.so : 1500 kB\n\t/lib/libc.so : n/a\n"));
        assert!(out.contains(" [Library Rss] : 0 kB\n"));
    }

    #[test]
    fn test_process_header() {
        let regions = regions(SCENARIO);
        let summary = Summary::aggregate(&regions, &LibraryFilter::default());
        let origin = Origin::Process {
            pid: "42".to_string(),
            cmd_line: Some("/usr/bin/program --flag".to_string()),
        };
        let out = App::new(ReportConfig::default(), summary)
            .with_origin(&origin)
            .to_string();

        assert!(out.starts_with("\n [Process 42: /usr/bin/program --flag]\n"));
        assert!(out.contains(" [Total Size] : 9842 kB in 4 regions\n"));
    }
}
