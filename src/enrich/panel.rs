// src/enrich/panel.rs
//
// Info-panel rows come in label/value pairs: a `mergedtoprow` carrying the
// label ("Area", "GDP (nominal)") followed by one or more `mergedrow`s with
// the values. Only the first value row after a wanted label is kept.

use scraper::{ElementRef, Selector};

pub const PANEL_TABLE: &str = "table.infobox.geography.vcard";

/// A panel row reduced to what the scan needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelRow {
    MergedTop {
        label: Option<String>,
        qualifier: Option<String>,
    },
    Merged {
        value: String,
    },
    Other,
}

impl PanelRow {
    pub fn classify(tr: ElementRef) -> Self {
        let a = Selector::parse("a").expect("a selector should parse");
        let span = Selector::parse("span").expect("span selector should parse");
        let td = Selector::parse("td").expect("td selector should parse");

        let first_text = |sel: &Selector| {
            tr.select(sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        };

        if has_only_class(tr, "mergedtoprow") {
            PanelRow::MergedTop {
                label: first_text(&a),
                qualifier: first_text(&span),
            }
        } else if has_only_class(tr, "mergedrow") {
            match tr.select(&td).next() {
                Some(cell) => PanelRow::Merged {
                    value: cell.text().collect::<String>().trim_matches('\n').to_string(),
                },
                None => PanelRow::Other,
            }
        } else {
            PanelRow::Other
        }
    }

    /// Label rows that open a value we want: total area and nominal GDP.
    fn opens_wanted_value(&self) -> bool {
        match self {
            PanelRow::MergedTop { label, qualifier } => match label.as_deref() {
                Some("Area") => true,
                Some("GDP") => qualifier.as_deref() == Some("(nominal)"),
                _ => false,
            },
            _ => false,
        }
    }
}

fn has_only_class(el: ElementRef, class: &str) -> bool {
    let mut classes = el.value().classes();
    classes.next() == Some(class) && classes.next().is_none()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    WaitingForLabel,
    ReadingValue,
}

impl ScanState {
    /// One transition of the scan. Returns the next state and the value
    /// captured by this row, if any.
    pub fn step(self, row: &PanelRow) -> (ScanState, Option<String>) {
        match (self, row) {
            (ScanState::WaitingForLabel, top @ PanelRow::MergedTop { .. })
                if top.opens_wanted_value() =>
            {
                (ScanState::ReadingValue, None)
            }
            (ScanState::ReadingValue, PanelRow::Merged { value }) => {
                (ScanState::WaitingForLabel, Some(value.clone()))
            }
            (state, _) => (state, None),
        }
    }
}

/// Run the scan over classified rows and collect every captured value.
pub fn scan<'a, I>(rows: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a PanelRow>,
{
    let mut state = ScanState::default();
    let mut values = Vec::new();
    for row in rows {
        let (next, value) = state.step(row);
        values.extend(value);
        state = next;
    }
    values
}
