//! Markdown rendering for decks and lab guides
//!
//! Pure string building with no I/O. The three deck formats share the same
//! slide content and differ only in framing: plain markdown, GitHub-flavored
//! markdown with slide headers, and reveal.js-compatible output with `---`
//! separators and speaker notes.

use crate::models::{LabGuide, Presentation};
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    Standard,
    Github,
    Reveal,
}

impl FromStr for RenderFormat {
    type Err = crate::error::Error;

    fn from_str(value: &str) -> crate::error::Result<Self> {
        match value.to_lowercase().as_str() {
            "standard" | "md" | "markdown" => Ok(Self::Standard),
            "github" | "gfm" => Ok(Self::Github),
            "reveal" | "revealjs" => Ok(Self::Reveal),
            _ => Err(crate::error::Error::Config(format!(
                "Unknown render format '{}'; expected standard, github, or reveal",
                value
            ))),
        }
    }
}

pub fn render(presentation: &Presentation, format: RenderFormat) -> String {
    match format {
        RenderFormat::Standard => render_standard(presentation),
        RenderFormat::Github => render_github(presentation),
        RenderFormat::Reveal => render_reveal(presentation),
    }
}

fn render_standard(p: &Presentation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", p.title);
    let _ = writeln!(out, "*{} | {}*\n", p.domain.title(), p.quarter);

    for slide in &p.slides {
        let _ = writeln!(out, "## {}\n", slide.title);
        if let Some(subtitle) = &slide.subtitle {
            let _ = writeln!(out, "*{}*\n", subtitle);
        }
        let _ = writeln!(out, "{}\n", slide.body.trim_end());
        if !slide.business_value.is_empty() {
            let _ = writeln!(out, "> {}\n", slide.business_value);
        }
    }

    story_arc_section(&mut out, p);
    out.trim_end().to_string() + "\n"
}

fn render_github(p: &Presentation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", p.title);
    let _ = writeln!(
        out,
        "**Domain:** {} | **Quarter:** {} | **Themes:** {}\n",
        p.domain.title(),
        p.quarter,
        p.featured_themes
            .iter()
            .map(|t| t.title())
            .collect::<Vec<_>>()
            .join(", ")
    );

    for (i, slide) in p.slides.iter().enumerate() {
        let _ = writeln!(out, "## Slide {}: {}\n", i + 1, slide.title);
        if let Some(subtitle) = &slide.subtitle {
            let _ = writeln!(out, "*{}*\n", subtitle);
        }
        let _ = writeln!(out, "{}\n", slide.body.trim_end());
        if !slide.business_value.is_empty() {
            let _ = writeln!(out, "**Business value:** {}\n", slide.business_value);
        }
        if let Some(track) = &slide.talk_track {
            let _ = writeln!(out, "<details><summary>Talk track</summary>\n");
            let _ = writeln!(out, "{}\n", track);
            let _ = writeln!(out, "</details>\n");
        }
    }

    story_arc_section(&mut out, p);
    out.trim_end().to_string() + "\n"
}

fn render_reveal(p: &Presentation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", p.title);
    let _ = writeln!(out, "{} | {}\n", p.domain.title(), p.quarter);

    for slide in &p.slides {
        let _ = writeln!(out, "---\n");
        let _ = writeln!(out, "## {}\n", slide.title);
        if let Some(subtitle) = &slide.subtitle {
            let _ = writeln!(out, "### {}\n", subtitle);
        }
        let _ = writeln!(out, "{}\n", slide.body.trim_end());
        if let Some(track) = &slide.talk_track {
            let _ = writeln!(out, "Note: {}\n", track);
        }
    }

    out.trim_end().to_string() + "\n"
}

fn story_arc_section(out: &mut String, p: &Presentation) {
    let Some(arc) = &p.story_arc else {
        return;
    };
    let _ = writeln!(out, "## Story Arc\n");
    let _ = writeln!(out, "- **Opening hook:** {}", arc.opening_hook);
    let _ = writeln!(out, "- **Central theme:** {}", arc.central_theme);
    let _ = writeln!(out, "- **Narrative thread:** {}", arc.narrative_thread);
    if let Some(climax) = &arc.climax_feature {
        let _ = writeln!(out, "- **Climax feature:** {}", climax);
    }
    let _ = writeln!(out, "- **Resolution:** {}", arc.resolution_message);
    let _ = writeln!(out, "- **Call to action:** {}\n", arc.call_to_action);
}

pub fn render_lab_guide(guide: &LabGuide) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", guide.title);
    let _ = writeln!(out, "Estimated time: {} minutes\n", guide.estimated_minutes);

    let _ = writeln!(out, "## Objectives\n");
    for objective in &guide.objectives {
        let _ = writeln!(out, "- {}", objective);
    }

    let _ = writeln!(out, "\n## Setup\n");
    for (i, step) in guide.setup_steps.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, step);
    }

    for exercise in &guide.exercises {
        let _ = writeln!(out, "\n## {}\n", exercise.title);
        for (i, step) in exercise.steps.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, step);
        }
    }

    let _ = writeln!(out, "\n## Validation\n");
    for step in &guide.validation {
        let _ = writeln!(out, "- {}", step);
    }

    let _ = writeln!(out, "\n## Cleanup\n");
    for step in &guide.cleanup {
        let _ = writeln!(out, "- {}", step);
    }

    out.trim_end().to_string() + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Domain, LabExercise, SlideContent, StoryArc, Theme};
    use chrono::Utc;

    fn slide(title: &str, talk_track: Option<&str>) -> SlideContent {
        SlideContent {
            title: title.to_string(),
            subtitle: Some("sub".to_string()),
            body: "Body text.".to_string(),
            business_value: "Saves time.".to_string(),
            theme: Theme::Simplify,
            story_position: None,
            talk_track: talk_track.map(|s| s.to_string()),
            customer_stories: vec![],
            business_impact: None,
        }
    }

    fn deck() -> Presentation {
        Presentation {
            title: "Q1 Deck".to_string(),
            slides: vec![slide("One", Some("say this")), slide("Two", None)],
            domain: Domain::Search,
            quarter: "2026 Q1".to_string(),
            feature_ids: vec![],
            featured_themes: vec![Theme::Simplify],
            story_arc: Some(StoryArc {
                opening_hook: "hook".to_string(),
                central_theme: "theme".to_string(),
                narrative_thread: "thread".to_string(),
                climax_feature: None,
                resolution_message: "resolution".to_string(),
                call_to_action: "act".to_string(),
            }),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("github".parse::<RenderFormat>().unwrap(), RenderFormat::Github);
        assert_eq!("REVEAL".parse::<RenderFormat>().unwrap(), RenderFormat::Reveal);
        assert!("pptx".parse::<RenderFormat>().is_err());
    }

    #[test]
    fn test_standard_contains_all_slides() {
        let md = render(&deck(), RenderFormat::Standard);
        assert!(md.starts_with("# Q1 Deck"));
        assert!(md.contains("## One"));
        assert!(md.contains("## Two"));
        assert!(md.contains("> Saves time."));
        assert!(md.contains("## Story Arc"));
    }

    #[test]
    fn test_github_numbers_slides_and_folds_talk_track() {
        let md = render(&deck(), RenderFormat::Github);
        assert!(md.contains("## Slide 1: One"));
        assert!(md.contains("## Slide 2: Two"));
        assert!(md.contains("<details><summary>Talk track</summary>"));
        assert!(md.contains("say this"));
    }

    #[test]
    fn test_reveal_separates_slides_and_adds_notes() {
        let md = render(&deck(), RenderFormat::Reveal);
        assert_eq!(md.matches("---").count(), 2);
        assert!(md.contains("Note: say this"));
        // No GitHub details blocks in reveal output
        assert!(!md.contains("<details>"));
    }

    #[test]
    fn test_lab_guide_renders_sections_in_order() {
        let guide = LabGuide {
            title: "Hands-on with BBQ".to_string(),
            feature_id: "f1".to_string(),
            objectives: vec!["learn".to_string()],
            setup_steps: vec!["provision".to_string()],
            exercises: vec![LabExercise {
                title: "Exercise 1: Try it".to_string(),
                steps: vec!["do the thing".to_string()],
            }],
            validation: vec!["confirm".to_string()],
            cleanup: vec!["tear down".to_string()],
            estimated_minutes: 25,
        };
        let md = render_lab_guide(&guide);

        let objectives = md.find("## Objectives").unwrap();
        let setup = md.find("## Setup").unwrap();
        let exercise = md.find("## Exercise 1").unwrap();
        let validation = md.find("## Validation").unwrap();
        let cleanup = md.find("## Cleanup").unwrap();
        assert!(objectives < setup && setup < exercise);
        assert!(exercise < validation && validation < cleanup);
        assert!(md.contains("25 minutes"));
    }
}
