use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use bitrans_core::{update, AppState, LlmConfig, Msg};
use bitrans_engine::{
    export_translation, load_project, save_project, ClientSettings, EngineHandle, ProjectKind,
    ProjectSnapshot,
};
use engine_logging::{engine_debug, engine_info};

use super::effects::EffectRunner;
use super::persistence::{load_settings, save_settings, Settings};
use super::render::ConsoleRenderer;
use crate::cli::{Cli, Command, Overrides};

/// How long to wait for an engine event before ticking.
const POLL_INTERVAL: Duration = Duration::from_millis(75);

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(&cli.settings);

    let (project, out, msg) = match cli.command {
        Command::InitSettings { force } => {
            return init_settings(&cli.settings, settings, &cli.overrides, force);
        }
        Command::Translate {
            project,
            scope,
            out,
        } => (
            project,
            out,
            Msg::StartTranslationClicked {
                scope: scope.map(Into::into),
            },
        ),
        Command::Glossary { project, out } => (project, out, Msg::BuildGlossaryClicked),
        Command::Split {
            project,
            index,
            side,
            position,
            out,
        } => (
            project,
            out,
            Msg::SplitRequested {
                index,
                side: side.into(),
                position,
            },
        ),
    };

    let engine = EngineHandle::new(ClientSettings::default())
        .context("failed to create the HTTP client")?;
    let mut session = Session::new(EffectRunner::new(engine));
    session.open(&project, &settings, &cli.overrides)?;
    session.dispatch(msg);
    session.run_until_idle()?;

    let view = session.state().view();
    if view.needs_scope_decision {
        bail!(
            "{} is partially translated; rerun with --scope all or --scope untranslated",
            project.display()
        );
    }
    session.save(&project, out.as_deref())?;

    if let Some(job) = view.job.filter(|job| !job.failed_batches.is_empty()) {
        bail!(
            "{} batches failed after all retries; rerun with --scope untranslated to retry them",
            job.failed_batches.len()
        );
    }
    Ok(())
}

fn init_settings(
    path: &Path,
    mut settings: Settings,
    overrides: &Overrides,
    force: bool,
) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    overrides.apply(&mut settings.translate, &mut settings.llm);
    save_settings(path, &settings)?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Drives the core state machine: messages in, effects out to the engine.
pub struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: ConsoleRenderer,
}

impl Session {
    pub fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            runner,
            renderer: ConsoleRenderer::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Loads a project. Settings stored in an archive win over the settings
    /// file; command-line overrides win over both.
    pub fn open(
        &mut self,
        path: &Path,
        settings: &Settings,
        overrides: &Overrides,
    ) -> anyhow::Result<()> {
        let project =
            load_project(path).with_context(|| format!("failed to open {}", path.display()))?;
        let mut translate = project
            .translate_config
            .unwrap_or_else(|| settings.translate.clone());
        let mut llm = archive_llm_config(project.llm_config, &settings.llm);
        overrides.apply(&mut translate, &mut llm);
        let prompts = project.prompts.unwrap_or_else(|| settings.prompts.clone());

        // Settings first: loading the article resets the unsaved flag.
        self.dispatch(Msg::TranslateConfigChanged(translate));
        self.dispatch(Msg::LlmConfigChanged(llm));
        self.dispatch(Msg::PromptsChanged(prompts));
        self.dispatch(Msg::GlossaryLoaded(project.glossary));
        self.dispatch(Msg::ArticleLoaded(project.segments));
        Ok(())
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        for change in state.take_changes() {
            engine_debug!("change: {:?}", change);
        }
        if state.consume_dirty() {
            let view = state.view();
            let _ = self.renderer.render(&view, &mut io::stdout().lock());
        }
        self.state = state;
        self.runner.run(effects);
    }

    /// Pumps engine events until the core has nothing outstanding.
    pub fn run_until_idle(&mut self) -> anyhow::Result<()> {
        while self.state.has_pending_work() {
            let msg = self
                .runner
                .next_msg(POLL_INTERVAL)
                .context("engine stopped with work outstanding")?
                .unwrap_or(Msg::Tick);
            self.dispatch(msg);
        }
        Ok(())
    }

    /// Saves to `out`, or back to the project when it is an archive, or next
    /// to a plain-text project as `.trs`. A `.txt` target gets the translation only.
    pub fn save(&mut self, project: &Path, out: Option<&Path>) -> anyhow::Result<()> {
        let target = save_target(project, out)?;
        if out.is_none() && !self.state.has_unsaved_changes() && target == project {
            engine_info!("{} unchanged; not saving", project.display());
            return Ok(());
        }

        let segments = self.state.article().to_segments();
        match ProjectKind::from_path(&target)? {
            ProjectKind::PlainText => export_translation(&target, &segments)?,
            ProjectKind::Archive => save_project(
                &target,
                &ProjectSnapshot {
                    segments: &segments,
                    glossary: self.state.glossary().entries(),
                    translate_config: self.state.translate_config(),
                    llm_config: self.state.llm_config(),
                    prompts: self.state.prompts(),
                },
            )?,
        }
        self.dispatch(Msg::ProjectSaved);
        println!("Saved {}", target.display());
        Ok(())
    }
}

/// Archive values win field by field; empty ones keep the settings file's.
fn archive_llm_config(archive: Option<LlmConfig>, settings: &LlmConfig) -> LlmConfig {
    match archive {
        Some(mut config) => {
            config.fill_missing_from(settings);
            config
        }
        None => settings.clone(),
    }
}

fn save_target(project: &Path, out: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(out) = out {
        return Ok(out.to_path_buf());
    }
    Ok(match ProjectKind::from_path(project)? {
        ProjectKind::Archive => project.to_path_buf(),
        ProjectKind::PlainText => project.with_extension("trs"),
    })
}
