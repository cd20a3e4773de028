//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! gallery / 2016
//! Directories
//! 001 summer/
//! 002 winter/
//! Images
//! 001 beach.jpg
//!     Thumb: /gallery/2016/beach.jpg?size=300
//!     Slide: /gallery/2016/beach.jpg?size=1200
//! ```
//!
//! ## Warm
//!
//! ```text
//! 001 gallery/2016/beach.jpg
//!     300px: generated
//!     1200px: cached
//! 002 gallery/2016/notes.jpg
//!     300px: failed (Failed to decode ...)
//!
//! Warmed 2 images: 1 generated, 1 cached, 1 failed
//! ```

use crate::gateway::Origin;
use crate::listing::Listing;
use crate::warm::WarmedImage;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Request URL for an image at a size, as a gallery page would embed it.
fn image_url(path: &str, size: u32) -> String {
    format!("/{}?size={}", path.trim_start_matches('/'), size)
}

fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::Original => "original",
        Origin::CacheHit => "cached",
        Origin::Generated => "generated",
    }
}

// ============================================================================
// List
// ============================================================================

/// Format a directory listing.
///
/// Header is the breadcrumb trail (or `/` at the root), followed by the
/// subdirectories and then the images with their thumbnail and slide URLs.
pub fn format_listing(listing: &Listing) -> Vec<String> {
    let mut lines = Vec::new();

    if listing.breadcrumbs.is_empty() {
        lines.push("/".to_string());
    } else {
        let trail: Vec<&str> = listing
            .breadcrumbs
            .iter()
            .map(|c| c.title.as_str())
            .collect();
        lines.push(trail.join(" / "));
    }

    if !listing.directories.is_empty() {
        lines.push("Directories".to_string());
        for (i, dir) in listing.directories.iter().enumerate() {
            lines.push(format!("{} {}/", format_index(i + 1), dir));
        }
    }

    if !listing.images.is_empty() {
        lines.push("Images".to_string());
        for (i, image) in listing.images.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), image.name));
            lines.push(format!(
                "{}Thumb: {}",
                indent(1),
                image_url(&image.path, image.thumb_size)
            ));
            lines.push(format!(
                "{}Slide: {}",
                indent(1),
                image_url(&image.path, image.slide_size)
            ));
        }
    }

    if listing.directories.is_empty() && listing.images.is_empty() {
        lines.push(format!("{}(empty)", indent(1)));
    }

    lines
}

pub fn print_listing(listing: &Listing) {
    for line in format_listing(listing) {
        println!("{}", line);
    }
}

// ============================================================================
// Warm
// ============================================================================

/// Format the per-image outcomes of a warm run plus a summary line.
pub fn format_warm_report(warmed: &[WarmedImage]) -> Vec<String> {
    let mut lines = Vec::new();
    let (mut generated, mut cached, mut failed) = (0usize, 0usize, 0usize);

    for (i, image) in warmed.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), image.path));
        for outcome in &image.outcomes {
            let status = match &outcome.result {
                Ok(origin) => {
                    match origin {
                        Origin::Generated => generated += 1,
                        Origin::CacheHit => cached += 1,
                        Origin::Original => {}
                    }
                    origin_label(*origin).to_string()
                }
                Err(e) => {
                    failed += 1;
                    format!("failed ({})", e)
                }
            };
            lines.push(format!("{}{}px: {}", indent(1), outcome.size, status));
        }
    }

    if !warmed.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Warmed {} image{}: {} generated, {} cached, {} failed",
        warmed.len(),
        if warmed.len() == 1 { "" } else { "s" },
        generated,
        cached,
        failed
    ));
    lines
}

pub fn print_warm_report(warmed: &[WarmedImage]) {
    for line in format_warm_report(warmed) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GalleryError;
    use crate::listing::{Crumb, ListedImage};
    use crate::warm::WarmOutcome;
    use std::path::PathBuf;

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_is_four_spaces_per_level() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn image_url_has_single_leading_slash() {
        assert_eq!(image_url("gallery/a.jpg", 300), "/gallery/a.jpg?size=300");
        assert_eq!(image_url("/gallery/a.jpg", 0), "/gallery/a.jpg?size=0");
    }

    // =========================================================================
    // format_listing
    // =========================================================================

    fn sample_listing() -> Listing {
        Listing {
            path: "gallery/2016".into(),
            breadcrumbs: vec![
                Crumb {
                    title: "gallery".into(),
                    href: "/gallery/".into(),
                },
                Crumb {
                    title: "2016".into(),
                    href: "/gallery/2016/".into(),
                },
            ],
            directories: vec!["summer".into(), "winter".into()],
            images: vec![ListedImage {
                name: "beach.jpg".into(),
                path: "gallery/2016/beach.jpg".into(),
                thumb_size: 300,
                slide_size: 1200,
            }],
        }
    }

    #[test]
    fn listing_full_output() {
        let lines = format_listing(&sample_listing());
        assert_eq!(
            lines,
            vec![
                "gallery / 2016",
                "Directories",
                "001 summer/",
                "002 winter/",
                "Images",
                "001 beach.jpg",
                "    Thumb: /gallery/2016/beach.jpg?size=300",
                "    Slide: /gallery/2016/beach.jpg?size=1200",
            ]
        );
    }

    #[test]
    fn listing_root_and_empty() {
        let listing = Listing {
            path: String::new(),
            breadcrumbs: vec![],
            directories: vec![],
            images: vec![],
        };
        assert_eq!(format_listing(&listing), vec!["/", "    (empty)"]);
    }

    // =========================================================================
    // format_warm_report
    // =========================================================================

    #[test]
    fn warm_report_counts_outcomes() {
        let warmed = vec![
            WarmedImage {
                path: "gallery/a.jpg".into(),
                outcomes: vec![
                    WarmOutcome {
                        size: 300,
                        result: Ok(Origin::Generated),
                    },
                    WarmOutcome {
                        size: 1200,
                        result: Ok(Origin::CacheHit),
                    },
                ],
            },
            WarmedImage {
                path: "gallery/b.jpg".into(),
                outcomes: vec![WarmOutcome {
                    size: 300,
                    result: Err(GalleryError::NotFound(PathBuf::from("gallery/b.jpg"))),
                }],
            },
        ];

        let lines = format_warm_report(&warmed);

        assert_eq!(lines[0], "001 gallery/a.jpg");
        assert_eq!(lines[1], "    300px: generated");
        assert_eq!(lines[2], "    1200px: cached");
        assert_eq!(lines[3], "002 gallery/b.jpg");
        assert!(lines[4].starts_with("    300px: failed (Image not found"));
        assert_eq!(
            lines.last().unwrap(),
            "Warmed 2 images: 1 generated, 1 cached, 1 failed"
        );
    }

    #[test]
    fn warm_report_empty_run() {
        assert_eq!(
            format_warm_report(&[]),
            vec!["Warmed 0 images: 0 generated, 0 cached, 0 failed"]
        );
    }
}
