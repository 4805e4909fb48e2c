use askama::Template;
use mc_core::models::{Category, CommuneOption};

/// Directory holding `contact.js` and `contact.css`, mounted at `/static`.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// The public contact page. `bootstrap_json` is the same payload as
/// `GET /contact/bootstrap`, inlined so the page works without a round trip.
#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate<'a> {
    pub title: &'a str,
    pub communes: &'a [CommuneOption],
    pub categories: &'a [Category],
    pub ajax_url: &'a str,
    pub nonce: &'a str,
    pub bootstrap_json: String,
}

/// Makes a JSON document safe to inline in a `<script>` element.
pub fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_selectors_and_nonce() {
        let communes = vec![CommuneOption { slug: "lyon".into(), label: "Lyon".into() }];
        let categories = vec![Category { slug: "voirie".into(), label: "Voirie".into() }];
        let html = ContactTemplate {
            title: "Contact",
            communes: &communes,
            categories: &categories,
            ajax_url: "/contact/send",
            nonce: "abc123",
            bootstrap_json: "{}".into(),
        }
        .render()
        .unwrap();

        assert!(html.contains(r#"<option value="lyon">Lyon</option>"#));
        assert!(html.contains(r#"<option value="voirie">Voirie</option>"#));
        assert!(html.contains(r#"value="abc123""#));
        assert!(html.contains(r#"id="mc-bootstrap""#));
    }

    #[test]
    fn labels_are_escaped() {
        let communes = vec![CommuneOption { slug: "x".into(), label: "<b>X</b>".into() }];
        let html = ContactTemplate {
            title: "Contact",
            communes: &communes,
            categories: &[],
            ajax_url: "/contact/send",
            nonce: "n",
            bootstrap_json: "{}".into(),
        }
        .render()
        .unwrap();
        assert!(!html.contains("<b>X</b>"));
    }

    #[test]
    fn script_safe_breaks_closing_tags() {
        assert_eq!(script_safe(r#"{"a":"</script>"}"#), r#"{"a":"<\/script>"}"#);
    }
}
