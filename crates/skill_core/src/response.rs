use std::num::NonZeroUsize;

use shared::{
    domain::CatalogRecord,
    error::SkillError,
    protocol::{Card, SkillResponse},
    session::{Browse, SessionAttributes},
};
use tracing::debug;

use crate::{
    config::{ListTemplate, ResponseTemplate},
    navigation::NavigationWindow,
    template::{join_english, render, Tokens},
};

#[derive(Debug, Clone, Copy)]
pub struct ListTemplates<'a> {
    pub list: &'a ListTemplate,
    pub no_results: &'a ResponseTemplate,
}

/// Renders one page of `records` starting at `browse.start_index`.
///
/// An empty list answers with the no-results template and only records the
/// attempted query. A start index past the end of the list restarts at the
/// first page.
pub fn build_list_response(
    records: &[CatalogRecord],
    browse: Browse,
    group_size: NonZeroUsize,
    templates: ListTemplates<'_>,
    extra: &Tokens,
    mut session: SessionAttributes,
) -> Result<SkillResponse, SkillError> {
    if records.is_empty() {
        session.record_attempt(browse.subject, browse.params);
        return Ok(build_template_response(
            templates.no_results,
            extra,
            session,
            false,
        ));
    }

    let window = match NavigationWindow::compute(browse.start_index, group_size, records.len()) {
        Ok(window) => window,
        Err(error) => {
            debug!(%error, subject = %browse.subject, "restarting list at first page");
            NavigationWindow::first(group_size, records.len())?
        }
    };

    let field = templates.list.display_field;
    let names: Vec<&str> = records[window.range()]
        .iter()
        .filter_map(|record| record.display(field))
        .collect();

    let mut tokens = extra.clone();
    tokens.insert("start", window.start_index + 1);
    tokens.insert("end", window.end_index + 1);
    tokens.insert("range", window_range(&window));
    tokens.insert("count", window.total);
    tokens.insert("items", join_english(&names));

    let rendered = templates.list.as_response().render(&tokens);
    session.set_browsing(&Browse {
        start_index: window.start_index,
        ..browse
    });

    Ok(build_simple_response(
        rendered.text,
        rendered.title,
        rendered.reprompt,
        session,
        false,
    ))
}

/// "3" for a one-record page, "3 to 5" otherwise.
fn window_range(window: &NavigationWindow) -> String {
    if window.start_index == window.end_index {
        (window.start_index + 1).to_string()
    } else {
        format!("{} to {}", window.start_index + 1, window.end_index + 1)
    }
}

/// Wraps already rendered text into a response. The spoken text doubles as
/// the card body and is kept in the session for repeat.
pub fn build_simple_response(
    text: String,
    title: String,
    reprompt: Option<String>,
    mut session: SessionAttributes,
    end_session: bool,
) -> SkillResponse {
    session.text = Some(text.clone());
    SkillResponse {
        card: Card {
            title,
            content: text.clone(),
        },
        text,
        reprompt,
        session_attributes: session,
        should_end_session: end_session,
    }
}

pub fn build_template_response(
    template: &ResponseTemplate,
    tokens: &Tokens,
    session: SessionAttributes,
    end_session: bool,
) -> SkillResponse {
    let rendered = template.render(tokens);
    build_simple_response(
        rendered.text,
        rendered.title,
        rendered.reprompt,
        session,
        end_session,
    )
}

#[cfg(test)]
#[path = "tests/response_tests.rs"]
mod tests;
