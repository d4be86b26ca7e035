use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use homeplan_planner::{Item, ListKind, PlannerView, SyncMode, ViewEvent, Weekday};
use strum::{Display, EnumString, IntoEnumIterator};

/// Independently replaceable parts of the page, named after the id of their
/// root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Fragment {
    Account,
    Tasks,
    Groceries,
    Meals,
    Status,
}

impl Fragment {
    /// Fragments to draw again after `event`.
    pub fn for_event(event: ViewEvent) -> &'static [Fragment] {
        match event {
            ViewEvent::Tasks => &[Fragment::Tasks],
            ViewEvent::Groceries => &[Fragment::Groceries],
            ViewEvent::Meals => &[Fragment::Meals],
            ViewEvent::Status => &[Fragment::Status],
            // Enablement changes every control on the page.
            ViewEvent::Session => &[
                Fragment::Account,
                Fragment::Tasks,
                Fragment::Groceries,
                Fragment::Meals,
            ],
        }
    }

    pub fn all() -> &'static [Fragment] {
        &[
            Fragment::Account,
            Fragment::Tasks,
            Fragment::Groceries,
            Fragment::Meals,
            Fragment::Status,
        ]
    }

    pub fn render(self, view: &PlannerView) -> askama::Result<String> {
        match self {
            Fragment::Account => AccountTemplate::new(view).render(),
            Fragment::Tasks => ChecklistTemplate::new(view, ListKind::Tasks).render(),
            Fragment::Groceries => ChecklistTemplate::new(view, ListKind::Groceries).render(),
            Fragment::Meals => MealsTemplate::new(view).render(),
            Fragment::Status => StatusTemplate::new(view).render(),
        }
    }
}

/// Login and household forms. Disabled altogether in local mode.
#[derive(Template)]
#[template(path = "partials/account.html")]
pub struct AccountTemplate {
    pub local: bool,
    pub email: Option<String>,
    pub household: String,
}

impl AccountTemplate {
    pub fn new(view: &PlannerView) -> Self {
        Self {
            local: view.mode == SyncMode::Local,
            email: view.session.as_ref().map(|session| session.email.to_owned()),
            household: view.household.clone().unwrap_or_default(),
        }
    }
}

/// One checklist, shared by tasks and groceries.
#[derive(Template)]
#[template(path = "partials/checklist.html")]
pub struct ChecklistTemplate {
    pub list: ListKind,
    pub title: &'static str,
    pub placeholder: &'static str,
    pub items: Vec<Item>,
    pub enabled: bool,
}

impl ChecklistTemplate {
    pub fn new(view: &PlannerView, list: ListKind) -> Self {
        let (title, placeholder) = match list {
            ListKind::Tasks => ("Chores", "Add a chore"),
            ListKind::Groceries => ("Groceries", "Add a grocery item"),
        };

        Self {
            list,
            title,
            placeholder,
            items: view.state.list(list).to_vec(),
            enabled: view.enabled,
        }
    }
}

pub struct MealRow {
    pub day: Weekday,
    pub value: String,
}

/// Fixed seven day meal editor.
#[derive(Template)]
#[template(path = "partials/meals.html")]
pub struct MealsTemplate {
    pub days: Vec<MealRow>,
    pub enabled: bool,
}

impl MealsTemplate {
    pub fn new(view: &PlannerView) -> Self {
        Self {
            days: Weekday::iter()
                .map(|day| MealRow {
                    day,
                    value: view.state.meal(day).to_owned(),
                })
                .collect(),
            enabled: view.enabled,
        }
    }
}

#[derive(Template)]
#[template(path = "partials/status.html")]
pub struct StatusTemplate {
    pub mode: SyncMode,
    pub status: String,
}

impl StatusTemplate {
    pub fn new(view: &PlannerView) -> Self {
        Self {
            mode: view.mode,
            status: view.status.to_owned(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub account: String,
    pub tasks: String,
    pub groceries: String,
    pub meals: String,
    pub status: String,
}

impl IndexTemplate {
    pub fn new(view: &PlannerView) -> askama::Result<Self> {
        Ok(Self {
            account: Fragment::Account.render(view)?,
            tasks: Fragment::Tasks.render(view)?,
            groceries: Fragment::Groceries.render(view)?,
            meals: Fragment::Meals.render(view)?,
            status: Fragment::Status.render(view)?,
        })
    }
}

pub fn render(html: askama::Result<String>) -> Response {
    match html {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            tracing::error!(err = %err, "failed to render template");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template. Error: {err}"),
            )
                .into_response()
        }
    }
}
