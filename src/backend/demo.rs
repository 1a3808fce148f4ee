//! Demo window used by the simulated backend when no host is present.

use super::SimulatedBackend;
use crate::bus::Notifier;
use crate::types::group::{Group, GroupColor, GroupId};
use crate::types::recent::ClosedTab;
use crate::types::tab::{Tab, TabId};

fn demo_tab(id: i64, index: usize, title: &str, url: &str, favicon: &str) -> Tab {
    let mut tab = Tab::new(TabId(id), index, title, url);
    tab.fav_icon_url = Some(favicon.to_string());
    tab
}

/// Eight tabs in host order: two pinned, two in "Work", two in "Shopping".
pub fn demo_tabs() -> Vec<Tab> {
    let mut tabs = vec![
        demo_tab(1, 0, "Google - Search", "https://google.com", "https://www.google.com/favicon.ico"),
        demo_tab(3, 1, "React Documentation", "https://react.dev", "https://react.dev/favicon.ico"),
        demo_tab(4, 2, "Tailwind CSS", "https://tailwindcss.com", "https://tailwindcss.com/favicon.ico"),
        demo_tab(2, 3, "Edge Design Guidelines", "https://microsoft.com/edge", "https://microsoft.com/favicon.ico"),
        demo_tab(5, 4, "Jira - Ticket #123", "https://jira.atlassian.com", "https://wac-cdn.atlassian.com/assets/img/favicons/atlassian/favicon.png"),
        demo_tab(6, 5, "GitHub - Repository", "https://github.com", "https://github.com/favicon.ico"),
        demo_tab(7, 6, "Amazon.com", "https://amazon.com", "https://www.amazon.com/favicon.ico"),
        demo_tab(8, 7, "Best Buy", "https://bestbuy.com", "https://www.bestbuy.com/favicon.ico"),
    ];
    tabs[0].active = true;
    tabs[1].pinned = true;
    tabs[2].pinned = true;
    tabs[3].group_id = GroupId(1);
    tabs[4].group_id = GroupId(1);
    tabs[6].group_id = GroupId(2);
    tabs[7].group_id = GroupId(2);
    tabs
}

pub fn demo_groups() -> Vec<Group> {
    vec![
        Group::new(GroupId(1), "Work", GroupColor::Blue),
        Group::new(GroupId(2), "Shopping", GroupColor::Pink),
    ]
}

pub fn demo_recently_closed() -> Vec<ClosedTab> {
    [
        (101, "Closed Tab 1", "https://example.com"),
        (102, "Old Article about React", "https://react.dev"),
        (103, "Funny Cat Video", "https://youtube.com"),
    ]
    .into_iter()
    .map(|(id, title, url)| ClosedTab {
        id,
        title: title.to_string(),
        url: url.to_string(),
    })
    .collect()
}

impl SimulatedBackend {
    /// A simulated backend seeded with the demo window.
    pub fn with_demo_data(notifier: Notifier, recent_limit: usize) -> Self {
        SimulatedBackend::new(demo_tabs(), demo_groups(), notifier)
            .with_recent_limit(recent_limit)
            .with_recently_closed(demo_recently_closed())
    }
}
