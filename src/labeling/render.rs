//! Panel markup for live pages.
//!
//! Radio values are candidate indices, or [`OTHER_VALUE`] for the free-text option, so a
//! heading that happens to read "Outra" cannot be confused with the free-text choice.

use crate::labeling::modal::{LabelingModal, Selection};

/// Radio value of the free-text option
pub const OTHER_VALUE: &str = "__other__";

/// Id of the free-text input inside the panel
pub const OTHER_INPUT_ID: &str = "__ux_outro_text";

/// Id of the form inside the panel
pub const FORM_ID: &str = "__ux_form";

const TITLE: &str = "Qual a sessão deste elemento?";
const OTHER_LABEL: &str = "Outra";
const OTHER_PLACEHOLDER: &str = "Digite a sessão";
const SUBMIT_LABEL: &str = "Salvar";

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Inner HTML of the modal panel
pub fn render_panel(modal: &LabelingModal) -> String {
    let mut html = format!("<b style='font-size:1.1em'>{}</b>", TITLE);
    html.push_str(&format!(
        "<div style='font-size:0.96em;margin-bottom:7px;color:#666'>Posição Y: <b>{}%</b></div>",
        modal.position_percent()
    ));
    html.push_str(&format!("<form id='{}' autocomplete='off' style='margin-top:8px'>", FORM_ID));

    for (index, candidate) in modal.candidates().iter().enumerate() {
        let checked = if modal.selection() == Selection::Candidate(index) { " checked" } else { "" };
        html.push_str(&format!(
            "<label style='margin:7px 0;display:block'><input type='radio' name='sessao' value='{}'{}/> {}</label>",
            index,
            checked,
            escape_html(candidate)
        ));
    }

    let other = modal.other_field();
    let other_checked = if modal.selection() == Selection::Other { " checked" } else { "" };
    let display = if other.visible { "" } else { "display:none" };
    html.push_str(&format!(
        "<label style='margin:10px 0 6px 0;display:block'><input type='radio' name='sessao' value='{}'{}/> {} \
         <input type='text' id='{}' placeholder='{}' value='{}' autocomplete='off' style='width:78%;margin-left:8px;{}'/></label>",
        OTHER_VALUE,
        other_checked,
        OTHER_LABEL,
        OTHER_INPUT_ID,
        OTHER_PLACEHOLDER,
        escape_html(&other.text),
        display
    ));
    html.push_str(&format!("<button type='submit' style='margin-top:14px'>{}</button></form>", SUBMIT_LABEL));
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Surface;

    #[test]
    fn test_render_lists_candidates_and_other() {
        let mut surface = Surface::new();
        let (modal, _pending) =
            LabelingModal::present(&mut surface, vec!["Planos".into(), "Menu".into()], 42, "prompt");

        let html = render_panel(&modal);
        assert!(html.contains("Posição Y: <b>42%</b>"));
        assert!(html.contains("value='0' checked/> Planos"));
        assert!(html.contains("value='1'/> Menu"));
        assert!(html.contains("value='__other__'/> Outra"));
        assert!(html.contains("display:none"));
    }

    #[test]
    fn test_render_escapes_candidate_text() {
        let mut surface = Surface::new();
        let (modal, _pending) =
            LabelingModal::present(&mut surface, vec!["<script>alert('x')</script>".into()], 0, "prompt");

        let html = render_panel(&modal);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn test_render_other_selected() {
        let mut surface = Surface::new();
        let (mut modal, _pending) = LabelingModal::present(&mut surface, vec!["Menu".into()], 0, "prompt");
        modal.select_other();
        modal.type_other("Depo\"imentos");

        let html = render_panel(&modal);
        assert!(html.contains("value='__other__' checked/>"));
        assert!(html.contains("value='Depo&quot;imentos'"));
        assert!(!html.contains("display:none"));
    }
}
