//! Link relations and image size selection.

use serde::{Deserialize, Serialize};

/// Size buckets available for proportionally scaled renditions
/// (`{N}pi`, `{N}wi`, `{N}hi` specs).
const INSCRIBE_SIZES: [u32; 19] = [
    50, 75, 115, 120, 150, 200, 220, 250, 320, 350, 400, 450, 500, 580, 620, 640, 650, 800, 1024,
];

/// Size buckets available for square-cropped renditions (`{N}si` specs).
const SQUARE_SIZES: [u32; 7] = [50, 75, 115, 120, 150, 220, 250];

/// Smallest bucket that covers the requested size, else the largest bucket.
fn pick_bucket(sizes: &[u32], requested: u32) -> u32 {
    sizes
        .iter()
        .copied()
        .find(|&size| size >= requested)
        .unwrap_or_else(|| sizes[sizes.len() - 1])
}

/// One entry in an object's `links` collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Link {
            rel: Some(rel.into()),
            href: Some(href.into()),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    fn has_rel(&self, rel: &str) -> bool {
        self.rel.as_deref() == Some(rel)
    }
}

/// The full set of links carried by an object, queried by relation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkSet {
    pub entries: Vec<Link>,
}

impl LinkSet {
    pub fn new(entries: Vec<Link>) -> Self {
        LinkSet { entries }
    }

    /// First link with the given relation.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.entries.iter().find(|l| l.has_rel(rel))
    }

    /// All links with the given relation, in document order.
    pub fn links(&self, rel: &str) -> Vec<&Link> {
        self.entries.iter().filter(|l| l.has_rel(rel)).collect()
    }

    /// `href` of the first link with the given relation.
    pub fn href(&self, rel: &str) -> Option<&str> {
        self.link(rel).and_then(|l| l.href.as_deref())
    }

    /// Among links with this relation, the one whose width is the smallest
    /// that covers `width`; if none is wide enough, the widest available.
    pub fn link_by_width(&self, rel: &str, width: u32) -> Option<&Link> {
        let sized = self
            .entries
            .iter()
            .filter(|l| l.has_rel(rel) && l.width.is_some());
        sized
            .clone()
            .filter(|l| l.width.unwrap_or(0) >= width)
            .min_by_key(|l| l.width.unwrap_or(u32::MAX))
            .or_else(|| sized.max_by_key(|l| l.width.unwrap_or(0)))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An image reference carrying a `{spec}` URL template for server-side
/// resizing.
///
/// `url` points at the original rendition; sizing methods substitute a
/// size spec (`pi`, `{N}pi`, `{N}wi`, `{N}hi`, `{N}si`) into `url_template`.
/// Requested sizes are rounded up to the next available bucket, falling
/// back to the largest bucket when the request exceeds all of them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImageLink {
    fn spec_url(&self, spec: &str) -> Option<String> {
        match &self.url_template {
            Some(template) => Some(template.replace("{spec}", spec)),
            None => self.url.clone(),
        }
    }

    /// URL of the original, unscaled rendition.
    pub fn original(&self) -> Option<String> {
        self.spec_url("pi")
    }

    /// URL of a rendition scaled to the bucketed width.
    pub fn by_width(&self, width: u32) -> Option<String> {
        self.spec_url(&format!("{}wi", pick_bucket(&INSCRIBE_SIZES, width)))
    }

    /// URL of a rendition scaled to the bucketed height.
    pub fn by_height(&self, height: u32) -> Option<String> {
        self.spec_url(&format!("{}hi", pick_bucket(&INSCRIBE_SIZES, height)))
    }

    /// URL of a rendition inscribed in a bucketed `size` x `size` box.
    pub fn inscribed(&self, size: u32) -> Option<String> {
        self.spec_url(&format!("{}pi", pick_bucket(&INSCRIBE_SIZES, size)))
    }

    /// URL of a square crop at the bucketed size.
    pub fn square(&self, size: u32) -> Option<String> {
        self.spec_url(&format!("{}si", pick_bucket(&SQUARE_SIZES, size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Bucket Selection Tests ==========

    #[test]
    fn test_pick_bucket_exact() {
        assert_eq!(pick_bucket(&INSCRIBE_SIZES, 250), 250);
    }

    #[test]
    fn test_pick_bucket_rounds_up() {
        assert_eq!(pick_bucket(&INSCRIBE_SIZES, 251), 320);
        assert_eq!(pick_bucket(&INSCRIBE_SIZES, 1), 50);
    }

    #[test]
    fn test_pick_bucket_falls_back_to_largest() {
        assert_eq!(pick_bucket(&INSCRIBE_SIZES, 5000), 1024);
        assert_eq!(pick_bucket(&SQUARE_SIZES, 5000), 250);
    }

    // ========== LinkSet Tests ==========

    fn sample_links() -> LinkSet {
        LinkSet::new(vec![
            Link::new("alternate", "http://example.com/page.html"),
            Link::new("enclosure", "http://example.com/a-75.jpg").with_size(75, 50),
            Link::new("enclosure", "http://example.com/a-320.jpg").with_size(320, 213),
            Link::new("enclosure", "http://example.com/a-640.jpg").with_size(640, 427),
        ])
    }

    #[test]
    fn test_link_first_match() {
        let links = sample_links();
        let first = links.link("enclosure").unwrap();
        assert_eq!(first.href.as_deref(), Some("http://example.com/a-75.jpg"));
    }

    #[test]
    fn test_links_all_matches() {
        let links = sample_links();
        assert_eq!(links.links("enclosure").len(), 3);
        assert_eq!(links.links("alternate").len(), 1);
        assert!(links.links("missing").is_empty());
    }

    #[test]
    fn test_href() {
        let links = sample_links();
        assert_eq!(links.href("alternate"), Some("http://example.com/page.html"));
        assert_eq!(links.href("missing"), None);
    }

    #[test]
    fn test_link_by_width_next_largest() {
        let links = sample_links();
        let chosen = links.link_by_width("enclosure", 100).unwrap();
        assert_eq!(chosen.width, Some(320));
    }

    #[test]
    fn test_link_by_width_falls_back_to_widest() {
        let links = sample_links();
        let chosen = links.link_by_width("enclosure", 2000).unwrap();
        assert_eq!(chosen.width, Some(640));
    }

    // ========== ImageLink Tests ==========

    fn template_image() -> ImageLink {
        ImageLink {
            url: Some("http://up.example.com/avatar-pi".to_string()),
            url_template: Some("http://up.example.com/avatar-{spec}".to_string()),
            width: Some(900),
            height: Some(600),
        }
    }

    #[test]
    fn test_image_link_original() {
        assert_eq!(
            template_image().original().unwrap(),
            "http://up.example.com/avatar-pi"
        );
    }

    #[test]
    fn test_image_link_by_width() {
        assert_eq!(
            template_image().by_width(300).unwrap(),
            "http://up.example.com/avatar-320wi"
        );
    }

    #[test]
    fn test_image_link_by_height() {
        assert_eq!(
            template_image().by_height(115).unwrap(),
            "http://up.example.com/avatar-115hi"
        );
    }

    #[test]
    fn test_image_link_square_uses_square_buckets() {
        // 320 is an inscribe bucket but not a square bucket.
        assert_eq!(
            template_image().square(160).unwrap(),
            "http://up.example.com/avatar-220si"
        );
    }

    #[test]
    fn test_image_link_without_template_falls_back_to_url() {
        let image = ImageLink {
            url: Some("http://up.example.com/raw.jpg".to_string()),
            url_template: None,
            width: None,
            height: None,
        };
        assert_eq!(image.by_width(300).unwrap(), "http://up.example.com/raw.jpg");
    }

    #[test]
    fn test_image_link_deserializes_camel_case() {
        let image: ImageLink = serde_json::from_str(
            "{\"url\": \"http://u/x-pi\", \"urlTemplate\": \"http://u/x-{spec}\", \"width\": 10}",
        )
        .unwrap();
        assert_eq!(image.url_template.as_deref(), Some("http://u/x-{spec}"));
        assert_eq!(image.width, Some(10));
    }
}
