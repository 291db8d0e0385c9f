//! Server-rendered HTML for the symptom form.

use illness_core::Diagnosis;
use std::fmt::Write as _;

const PLACEHOLDER: &str = "e.g., cough, fever, headache";

pub(crate) enum Outcome<'a> {
    Empty,
    Prediction {
        diagnosis: &'a Diagnosis,
        report_url: String,
    },
    Error {
        message: String,
        unrecognised: &'a [String],
    },
}

/// Escapes text for use in element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn render_page(symptoms: &str, outcome: &Outcome<'_>) -> String {
    let mut body = String::new();
    match outcome {
        Outcome::Empty => {}
        Outcome::Prediction {
            diagnosis,
            report_url,
        } => {
            let _ = write!(
                body,
                r#"<section class="result">
<label>Predicted Disease</label><output id="disease">{}</output>
<label>Confidence Score</label><output id="confidence">{}</output>
<label>Disease Description</label><output id="description">{}</output>
<label>Precaution</label><output id="precaution">{}</output>
"#,
                escape_html(&diagnosis.disease),
                diagnosis.confidence_text(),
                escape_html(&diagnosis.description),
                escape_html(&diagnosis.precaution),
            );
            if !diagnosis.unrecognised.is_empty() {
                let _ = writeln!(
                    body,
                    r#"<p class="warning">Ignored unrecognised symptoms: {}</p>"#,
                    escape_html(&diagnosis.unrecognised.join(", "))
                );
            }
            let _ = write!(
                body,
                r#"<a class="download" href="{}" download>Download Prediction Report</a>
</section>
"#,
                escape_html(report_url)
            );
        }
        Outcome::Error {
            message,
            unrecognised,
        } => {
            let _ = writeln!(
                body,
                r#"<p class="error" role="alert">{}</p>"#,
                escape_html(message)
            );
            if !unrecognised.is_empty() {
                let _ = writeln!(
                    body,
                    r#"<p class="hint">Check the spelling of: {}</p>"#,
                    escape_html(&unrecognised.join(", "))
                );
            }
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Illness Intel: Disease Predictor</title>
<style>
body {{ font-family: sans-serif; max-width: 42rem; margin: 2rem auto; }}
label {{ display: block; font-weight: bold; margin-top: 1rem; }}
input[type=text] {{ width: 100%; padding: 0.4rem; }}
output {{ display: block; }}
.error {{ color: #b00020; }}
.warning, .hint {{ color: #8a6d00; }}
.download {{ display: inline-block; margin-top: 1rem; }}
</style>
</head>
<body>
<h1>Illness Intel: Disease Predictor</h1>
<p>Enter your symptoms separated by commas to get a predicted disease, a confidence score, a description and precautions.</p>
<form method="post" action="/predict">
<label for="symptoms">Enter Symptoms</label>
<input type="text" id="symptoms" name="symptoms" placeholder="{PLACEHOLDER}" value="{}">
<button type="submit">Submit</button>
<button type="submit" formaction="/clear" formmethod="get">Clear</button>
</form>
{body}</body>
</html>
"#,
        escape_html(symptoms)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnosis() -> Diagnosis {
        Diagnosis {
            symptoms: "itching".into(),
            disease: "Fungal infection".into(),
            label: 0,
            confidence: 91.25,
            description: "Caused by <fungi> & friends.".into(),
            precaution: "bath twice".into(),
            recognised: vec!["itching".into()],
            unrecognised: vec!["purple spots".into()],
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_empty_page_has_form_and_buttons() {
        let page = render_page("", &Outcome::Empty);
        assert!(page.contains(r#"placeholder="e.g., cough, fever, headache""#));
        assert!(page.contains(">Submit</button>"));
        assert!(page.contains(">Clear</button>"));
        assert!(!page.contains("Predicted Disease"));
    }

    #[test]
    fn test_prediction_page_shows_four_outputs_and_link() {
        let d = diagnosis();
        let page = render_page(
            "itching",
            &Outcome::Prediction {
                diagnosis: &d,
                report_url: "/reports/abc".into(),
            },
        );
        assert!(page.contains(r#"<output id="disease">Fungal infection</output>"#));
        assert!(page.contains(r#"<output id="confidence">91.25%</output>"#));

        let mut whole = diagnosis();
        whole.confidence = 80.0;
        let page = render_page(
            "itching",
            &Outcome::Prediction {
                diagnosis: &whole,
                report_url: "/reports/abc".into(),
            },
        );
        assert!(page.contains(r#"<output id="confidence">80.0%</output>"#));
        assert!(page.contains("Caused by &lt;fungi&gt; &amp; friends."));
        assert!(page.contains(r#"href="/reports/abc""#));
        assert!(page.contains("Ignored unrecognised symptoms: purple spots"));
        assert!(page.contains(r#"value="itching""#));
    }

    #[test]
    fn test_error_page_escapes_input() {
        let page = render_page(
            "<script>",
            &Outcome::Error {
                message: "no symptoms were entered".into(),
                unrecognised: &[],
            },
        );
        assert!(page.contains("no symptoms were entered"));
        assert!(page.contains(r#"value="&lt;script&gt;""#));
        assert!(!page.contains("<script>"));
    }
}
