// src/models/nav.rs

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::profile::Role;

// Páginas do painel que aparecem na barra lateral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardPage {
    Overview,
    Today,
    Schedule,
    Passes,
    Bundles,
    Payouts,
    Staff,
    AddGym,
    Settings,
}

impl DashboardPage {
    pub const ALL: [DashboardPage; 9] = [
        DashboardPage::Overview,
        DashboardPage::Today,
        DashboardPage::Schedule,
        DashboardPage::Passes,
        DashboardPage::Bundles,
        DashboardPage::Payouts,
        DashboardPage::Staff,
        DashboardPage::AddGym,
        DashboardPage::Settings,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DashboardPage::Overview => "Overview",
            DashboardPage::Today => "Today",
            DashboardPage::Schedule => "Schedule",
            DashboardPage::Passes => "Passes",
            DashboardPage::Bundles => "Bundles",
            DashboardPage::Payouts => "Payouts",
            DashboardPage::Staff => "Staff",
            DashboardPage::AddGym => "Add Gym",
            DashboardPage::Settings => "Settings",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            DashboardPage::Overview => "/",
            DashboardPage::Today => "/today",
            DashboardPage::Schedule => "/schedule",
            DashboardPage::Passes => "/passes",
            DashboardPage::Bundles => "/bundles",
            DashboardPage::Payouts => "/payouts",
            DashboardPage::Staff => "/staff",
            DashboardPage::AddGym => "/add-gym",
            DashboardPage::Settings => "/settings",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            DashboardPage::Overview => "overview",
            DashboardPage::Today => "today",
            DashboardPage::Schedule => "schedule",
            DashboardPage::Passes => "passes",
            DashboardPage::Bundles => "bundles",
            DashboardPage::Payouts => "payouts",
            DashboardPage::Staff => "staff",
            DashboardPage::AddGym => "add-gym",
            DashboardPage::Settings => "settings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

impl From<DashboardPage> for NavItem {
    fn from(page: DashboardPage) -> Self {
        NavItem {
            label: page.label(),
            path: page.path(),
        }
    }
}

/// Itens da barra lateral visíveis para um papel.
///
/// Papéis sem acesso ao painel não veem nada. O dono que já tem academia
/// não vê "Add Gym" (o backend só aceita uma academia por dono).
pub fn visible_items(role: Option<&Role>, has_gym: bool) -> Vec<NavItem> {
    let Some(role) = role.filter(|r| r.is_valid()) else {
        return Vec::new();
    };

    DashboardPage::ALL
        .into_iter()
        .filter(|page| !(*page == DashboardPage::AddGym && role.requires_gym() && has_gym))
        .map(NavItem::from)
        .collect()
}
