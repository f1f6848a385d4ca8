use crate::fetch_mode::{fetch_error, status_error};
use crate::rearm::collect_scripts;
use crate::{
    classify, resolve_content, resolve_url, sanitize, strip_error_prefix, AppState, ContentKind,
    Effect, FetchColumns, FetchOutcome, FetchTarget, Msg, SourceRecord, Surface, ViewerMode,
    FETCHING_MESSAGE, NOTHING_TO_FETCH_MESSAGE, NO_COLUMN_MESSAGE, NO_URL_MESSAGE,
    STORED_MESSAGE, STORING_MESSAGE,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::NewRecord => {
            state.reset();
            let mut effects = vec![Effect::ClearBanner, Effect::ClearSurface];
            if matches!(state.mode(), ViewerMode::FetchInto(_)) {
                effects.push(Effect::ShowStatus(String::new()));
            }
            effects
        }
        Msg::Record { record, mapping } => match state.mode().clone() {
            ViewerMode::Render => match resolve_content(&record, mapping.as_ref()) {
                None => {
                    let banner = state.fail(NO_COLUMN_MESSAGE);
                    state.clear_surface();
                    vec![Effect::ShowBanner(banner), Effect::ClearSurface]
                }
                Some(content) => render_record(&mut state, record.id, content),
            },
            ViewerMode::FetchInto(columns) => select_fetch_record(&mut state, &record, &columns),
        },
        Msg::FrameFetched { url, outcome } => match outcome {
            // Error pages are displayed in the frame too, so their body is mirrored.
            FetchOutcome::Body(body) | FetchOutcome::Rejected { body, .. } => {
                vec![Effect::AppendMirror { content: body }]
            }
            FetchOutcome::Failed(message) => {
                let still_framed = matches!(state.surface(), Surface::Frame { url: shown } if *shown == url);
                if still_framed {
                    vec![Effect::ShowBanner(state.fail(&message))]
                } else {
                    Vec::new()
                }
            }
        },
        Msg::MirrorAppendFailed(message) | Msg::Fault(message) => {
            vec![Effect::ShowBanner(state.fail(&message))]
        }
        Msg::FetchRequested => request_fetch(&mut state),
        Msg::ContentFetched { record_id, outcome } => content_fetched(&mut state, record_id, outcome),
        Msg::ContentStored { record_id, content } => {
            let mut effects = vec![Effect::ShowStatus(state.set_status(STORED_MESSAGE))];
            let still_selected = state
                .fetch_target()
                .is_some_and(|target| target.record_id == record_id);
            if still_selected {
                state.show(Surface::Markup {
                    markup: content.clone(),
                });
                effects.push(Effect::InjectMarkup { markup: content });
            }
            effects
        }
        Msg::ContentStoreFailed(message) => {
            let status = fetch_error(strip_error_prefix(&message));
            vec![Effect::ShowStatus(state.set_status(status))]
        }
    };

    (state, effects)
}

fn render_record(state: &mut AppState, id: i64, content: String) -> Vec<Effect> {
    let mut effects = Vec::new();
    if state.clear_banner() {
        effects.push(Effect::ClearBanner);
    }
    if state.is_current(id, &content) {
        return effects;
    }
    state.remember(id, content.clone());

    if content.is_empty() {
        state.show(Surface::Hidden);
        effects.push(Effect::ClearSurface);
        return effects;
    }

    match classify(&content) {
        ContentKind::Url => {
            state.show(Surface::Frame {
                url: content.clone(),
            });
            effects.push(Effect::ShowFrame {
                url: content.clone(),
            });
            effects.push(Effect::FetchBody { url: content });
        }
        ContentKind::Markup => match sanitize(&content, state.policy()) {
            Ok(markup) => {
                effects.push(Effect::InjectMarkup {
                    markup: markup.clone(),
                });
                if state.policy().rearms_scripts() {
                    let scripts = collect_scripts(&markup);
                    if !scripts.is_empty() {
                        effects.push(Effect::RearmScripts { scripts });
                    }
                }
                state.show(Surface::Markup { markup });
                // The mirror keeps the source as entered, not the sanitized form.
                effects.push(Effect::AppendMirror { content });
            }
            Err(err) => {
                let banner = state.fail(&err.to_string());
                state.clear_surface();
                effects.push(Effect::ShowBanner(banner));
                effects.push(Effect::ClearSurface);
            }
        },
    }
    effects
}

fn select_fetch_record(
    state: &mut AppState,
    record: &SourceRecord,
    columns: &FetchColumns,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    if state.clear_banner() {
        effects.push(Effect::ClearBanner);
    }
    state.show(Surface::Hidden);
    effects.push(Effect::ClearSurface);

    let url = resolve_url(record, columns);
    let status = if url.is_some() { "" } else { NO_URL_MESSAGE };
    state.target(url.map(|url| FetchTarget {
        record_id: record.id,
        url,
    }));
    effects.push(Effect::ShowStatus(state.set_status(status)));
    effects
}

fn request_fetch(state: &mut AppState) -> Vec<Effect> {
    if *state.mode() == ViewerMode::Render {
        return Vec::new();
    }
    match state.fetch_target().cloned() {
        Some(FetchTarget { record_id, url }) => vec![
            Effect::ShowStatus(state.set_status(FETCHING_MESSAGE)),
            Effect::FetchForRecord { record_id, url },
        ],
        None => vec![Effect::ShowStatus(state.set_status(NOTHING_TO_FETCH_MESSAGE))],
    }
}

fn content_fetched(state: &mut AppState, record_id: i64, outcome: FetchOutcome) -> Vec<Effect> {
    let status = match outcome {
        FetchOutcome::Body(body) => match sanitize(&body, state.policy()) {
            Ok(content) => {
                return vec![
                    Effect::ShowStatus(state.set_status(STORING_MESSAGE)),
                    Effect::StoreContent { record_id, content },
                ];
            }
            Err(err) => fetch_error(&err.to_string()),
        },
        FetchOutcome::Rejected { status_text, .. } => status_error(&status_text),
        FetchOutcome::Failed(message) => fetch_error(strip_error_prefix(&message)),
    };
    vec![Effect::ShowStatus(state.set_status(status))]
}
