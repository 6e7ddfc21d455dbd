//! Progress reporting for council execution

use colored::Colorize;
use council_application::CouncilProgress;
use council_domain::{Model, Stage};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress during council execution with fancy progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    stage_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            stage_bar: Mutex::new(None),
        }
    }

    fn stage_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap()
    }

    fn stage_short_name(stage: Stage) -> &'static str {
        match stage {
            Stage::Collect => "Stage 1",
            Stage::Rank => "Stage 2",
            Stage::Synthesize => "Stage 3",
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CouncilProgress for ProgressReporter {
    fn on_stage_start(&self, stage: Stage, models: &[Model]) {
        // Synthesis is a single chairman call, so a spinner fits better
        let pb = if models.len() <= 1 {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb
        } else {
            let pb = self.multi.add(ProgressBar::new(models.len() as u64));
            pb.set_style(Self::stage_style());
            pb
        };
        pb.set_prefix(stage.display_name());
        pb.set_message("Starting...");

        *self.stage_bar.lock().unwrap() = Some(pb);
    }

    fn on_model_complete(&self, _stage: Stage, model: &Model, success: bool) {
        if let Some(pb) = self.stage_bar.lock().unwrap().as_ref() {
            let status = if success {
                format!("{} {}", "v".green(), model)
            } else {
                format!("{} {}", "x".red(), model)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_stage_complete(&self, stage: Stage) {
        if let Some(pb) = self.stage_bar.lock().unwrap().take() {
            let stage_name = Self::stage_short_name(stage);
            pb.finish_with_message(format!("{} complete!", stage_name.green()));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl CouncilProgress for SimpleProgress {
    fn on_stage_start(&self, stage: Stage, models: &[Model]) {
        println!(
            "{} {} ({} models)",
            "->".cyan(),
            stage.display_name().bold(),
            models.len()
        );
    }

    fn on_model_complete(&self, _stage: Stage, model: &Model, success: bool) {
        if success {
            println!("  {} {}", "v".green(), model);
        } else {
            println!("  {} {} (failed)", "x".red(), model);
        }
    }

    fn on_stage_complete(&self, _stage: Stage) {
        println!();
    }

    fn on_title_complete(&self, title: &str) {
        println!("{} {}", "Title:".dimmed(), title);
    }
}
