use std::sync::Arc;

use shared::{
    domain::{CatalogRecord, NavigationCommand, QueryParams, QuerySubject},
    error::SkillError,
    protocol::SkillResponse,
    session::{Browse, SessionAttributes, SessionState},
};
use tracing::{info, warn};

pub mod config;
pub mod handlers;
pub mod intent;
pub mod navigation;
pub mod query;
pub mod response;
pub mod template;

use config::{ListKey, SkillConfig, TemplateKey};
use navigation::{advance, Step};
use query::QuerySource;
use response::{build_list_response, build_template_response, ListTemplates};
use template::Tokens;

pub use handlers::handle_request;

/// Read-only state shared by every turn.
#[derive(Clone)]
pub struct SkillContext {
    pub catalog: Arc<dyn QuerySource>,
    pub config: Arc<SkillConfig>,
}

impl SkillContext {
    pub fn new(catalog: Arc<dyn QuerySource>, config: SkillConfig) -> Self {
        Self {
            catalog,
            config: Arc::new(config),
        }
    }

    pub fn respond(
        &self,
        key: TemplateKey,
        tokens: &Tokens,
        session: SessionAttributes,
    ) -> Result<SkillResponse, SkillError> {
        let template = self.config.templates.response(key)?;
        Ok(build_template_response(template, tokens, session, false))
    }

    pub fn respond_and_end(
        &self,
        key: TemplateKey,
        tokens: &Tokens,
        session: SessionAttributes,
    ) -> Result<SkillResponse, SkillError> {
        let template = self.config.templates.response(key)?;
        Ok(build_template_response(template, tokens, session, true))
    }
}

/// Moves an existing browsing session to another page.
///
/// `stop` ends the conversation whether or not a list is open. Every other
/// command outside a list answers with the not-in-list template.
pub async fn navigate_list(
    ctx: &SkillContext,
    command: NavigationCommand,
    session: Option<SessionAttributes>,
) -> Result<SkillResponse, SkillError> {
    let mut session = session.unwrap_or_default();

    if command == NavigationCommand::Stop {
        session.apply(&SessionState::Idle);
        return ctx.respond_and_end(TemplateKey::Goodbye, &Tokens::new(), session);
    }

    let SessionState::Browsing(browse) = session.state() else {
        warn!(?command, "navigation requested outside of a list");
        return ctx.respond(TemplateKey::NotInList, &Tokens::new(), session);
    };

    info!(
        ?command,
        subject = %browse.subject,
        start_index = browse.start_index,
        "navigating list"
    );

    let records = fetch_records(ctx, browse.subject, browse.params.as_ref()).await;
    let group_size = ctx.config.group_size_for(browse.subject);
    let key = ListKey::for_query(browse.subject, browse.params.as_ref());
    let templates = ListTemplates {
        list: &ctx.config.templates.list(key)?.navigation,
        no_results: ctx.config.templates.response(TemplateKey::NoResults)?,
    };
    let tokens = list_tokens(key, browse.params.as_ref());

    let start_index = match advance(command, browse.start_index, group_size, records.len()) {
        Ok(Step::Moved(index)) => index,
        Ok(Step::Stopped) => {
            session.apply(&SessionState::Idle);
            return ctx.respond_and_end(TemplateKey::Goodbye, &Tokens::new(), session);
        }
        Err(SkillError::NoResults) => browse.start_index,
        Err(other) => return Err(other),
    };

    build_list_response(
        &records,
        Browse {
            start_index,
            ..browse
        },
        group_size,
        templates,
        &tokens,
        session,
    )
}

/// Renders the first page of a freshly issued query.
pub fn render_list_response(
    ctx: &SkillContext,
    records: &[CatalogRecord],
    subject: QuerySubject,
    params: Option<QueryParams>,
    session: SessionAttributes,
) -> Result<SkillResponse, SkillError> {
    let params = params.filter(|params| !params.is_empty());
    let key = ListKey::for_query(subject, params.as_ref());
    let set = ctx.config.templates.list(key)?;
    let templates = ListTemplates {
        list: if records.len() == 1 {
            &set.single
        } else {
            &set.initial
        },
        no_results: ctx.config.templates.response(TemplateKey::NoResults)?,
    };
    let tokens = list_tokens(key, params.as_ref());

    build_list_response(
        records,
        Browse {
            subject,
            params,
            start_index: 0,
        },
        ctx.config.group_size_for(subject),
        templates,
        &tokens,
        session,
    )
}

/// Runs a query and renders its first page.
pub async fn run_list_query(
    ctx: &SkillContext,
    subject: QuerySubject,
    params: Option<QueryParams>,
    session: SessionAttributes,
) -> Result<SkillResponse, SkillError> {
    let records = fetch_records(ctx, subject, params.as_ref()).await;
    render_list_response(ctx, &records, subject, params, session)
}

/// A failed fetch is logged and treated as an empty list.
pub async fn fetch_records(
    ctx: &SkillContext,
    subject: QuerySubject,
    params: Option<&QueryParams>,
) -> Vec<CatalogRecord> {
    match ctx.catalog.run_query(subject, params).await {
        Ok(records) => records,
        Err(error) => {
            let error = SkillError::Catalog(format!("{error:#}"));
            warn!(%error, %subject, "catalog query failed; treating as empty");
            Vec::new()
        }
    }
}

fn list_tokens(key: ListKey, params: Option<&QueryParams>) -> Tokens {
    let mut tokens = Tokens::new();
    if let Some(name) = key.name_token(params) {
        tokens.insert("name", name);
    }
    tokens
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
