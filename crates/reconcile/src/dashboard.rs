//! Dashboard definitions.

use crate::layout::Grid;
use zabbix::{NewDashboard, Widget, WidgetField};

/// Item graphed for every host on the overview dashboard.
pub const CPU_ITEM: &str = "system.cpu.util";
/// Item graphed for every web host on the web dashboard.
pub const WEB_ITEM: &str = "nginx.requests.total";

/// Simple-graph source type for the `graph` widget.
const SIMPLE_GRAPH: i64 = 1;
/// Problem display mode showing recent and current problems.
const SHOW_HISTORY: i64 = 3;

/// One graph tile: a resolved item and its title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    pub title: String,
    pub itemid: String,
}

/// Which kind of header tops the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header {
    /// Problem counts per host.
    HostStatus,
    /// Problem list.
    Problems,
}

impl Header {
    fn widget_type(self) -> &'static str {
        match self {
            Self::HostStatus => "problemhosts",
            Self::Problems => "problems",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::HostStatus => "Host Status",
            Self::Problems => "Web Server Problems",
        }
    }

    fn fields(self, groupid: &str) -> Vec<WidgetField> {
        let mut fields = vec![WidgetField::host_group("groupids", groupid)];
        if self == Self::Problems {
            fields.push(WidgetField::integer("show", SHOW_HISTORY));
        }
        fields
    }
}

/// Build a single-page dashboard: the header, then one tile per graph.
pub fn build(name: &str, header: Header, groupid: &str, graphs: &[Graph], grid: &Grid) -> NewDashboard {
    let placements = grid.place(graphs.len());

    let mut widgets = Vec::with_capacity(placements.len());
    let mut slots = placements.into_iter();

    if let Some(slot) = slots.next() {
        widgets.push(Widget {
            kind: header.widget_type().to_string(),
            name: header.title().to_string(),
            x: slot.x,
            y: slot.y,
            width: slot.width,
            height: slot.height,
            fields: header.fields(groupid),
        });
    }

    for (graph, slot) in graphs.iter().zip(slots) {
        widgets.push(Widget {
            kind: "graph".to_string(),
            name: graph.title.clone(),
            x: slot.x,
            y: slot.y,
            width: slot.width,
            height: slot.height,
            fields: vec![
                WidgetField::integer("source_type", SIMPLE_GRAPH),
                WidgetField::item("itemid", &graph.itemid),
            ],
        });
    }

    NewDashboard::single_page(name, widgets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graphs(n: usize) -> Vec<Graph> {
        (0..n)
            .map(|i| Graph {
                title: format!("CPU - host{i}"),
                itemid: format!("{}", 30000 + i),
            })
            .collect()
    }

    #[test]
    fn test_overview_widgets() {
        let dashboard = build("System Overview", Header::HostStatus, "15", &graphs(3), &Grid::default());
        let widgets = &dashboard.pages[0].widgets;

        assert_eq!(widgets.len(), 4);
        assert_eq!(widgets[0].kind, "problemhosts");
        assert_eq!(widgets[0].width, 12);
        assert_eq!(widgets[0].fields, vec![WidgetField::host_group("groupids", "15")]);

        assert_eq!(widgets[1].kind, "graph");
        assert_eq!((widgets[1].x, widgets[1].y), (0, 4));
        assert_eq!((widgets[2].x, widgets[2].y), (6, 4));
        assert_eq!((widgets[3].x, widgets[3].y), (0, 8));
        assert_eq!(widgets[3].fields[1], WidgetField::item("itemid", "30002"));
    }

    #[test]
    fn test_problems_header_shows_history() {
        let dashboard = build("Web Servers", Header::Problems, "15", &[], &Grid::default());
        let header = &dashboard.pages[0].widgets[0];
        assert_eq!(header.kind, "problems");
        assert_eq!(header.name, "Web Server Problems");
        assert!(header.fields.contains(&WidgetField::integer("show", 3)));
    }

    #[test]
    fn test_serialized_shape() {
        let dashboard = build("D", Header::HostStatus, "1", &graphs(1), &Grid::default());
        let value = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(value["name"], "D");
        assert_eq!(value["pages"][0]["widgets"][1]["type"], "graph");
        assert_eq!(value["pages"][0]["widgets"][1]["fields"][1]["type"], 4);
    }
}
