//! Form, input, select, option and textarea semantics over the element
//! tree, and `application/x-www-form-urlencoded` data encoding.
//!
//! Accessors raise on ambiguous form state rather than guessing: duplicate
//! non-radio names, several checked radio buttons, several selected options
//! where one is expected, and unknown option values are all
//! [`Error::UnsupportedForm`].

use encoding_rs as enc;
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::dom::{Document, Element, NodeId};
use crate::error::Error;

/// Input-like element accessors, keyed on the tag name.
impl Element {
    /// True for the form-associated elements collected at submission:
    /// `input`, `select` and `textarea`.
    pub fn is_form_field(&self) -> bool {
        match self.name().as_ref() {
            "input" | "select" | "textarea" => true,
            _ => false,
        }
    }

    /// The control's `name` attribute, if present.
    pub fn input_name(&self) -> Option<&str> {
        self.attr("name").map(|v| v.as_ref())
    }

    /// The control type.
    ///
    /// `"select"` and `"textarea"` for those elements; otherwise the `type`
    /// attribute lowercased and trimmed, defaulting to `"text"` when
    /// absent.
    pub fn input_type(&self) -> String {
        match self.name().as_ref() {
            "select" => "select".to_owned(),
            "textarea" => "textarea".to_owned(),
            _ => match self.attr("type") {
                Some(t) => t.trim().to_ascii_lowercase(),
                None => "text".to_owned(),
            }
        }
    }

    /// The control's value.
    ///
    /// For a textarea this is the element text. For radio buttons and
    /// checkboxes the `value` attribute defaults to `"on"`; for the rest it
    /// defaults to empty. Select elements are valued through
    /// [`Document::select_value`] instead.
    pub fn input_value(&self) -> String {
        if self.name().as_ref() == "textarea" {
            return self.text.to_string();
        }
        match self.attr("value") {
            Some(v) => v.to_string(),
            None => {
                match self.input_type().as_str() {
                    "radio" | "checkbox" => "on".to_owned(),
                    _ => String::new(),
                }
            }
        }
    }

    /// Assign the control's value: element text for a textarea, the `value`
    /// attribute otherwise.
    pub fn set_input_value(&mut self, value: &str) {
        if self.name().as_ref() == "textarea" {
            self.text = value.into();
        } else {
            self.set_attr("value", value);
        }
    }

    /// Whether the control participates in submission: the inverse of the
    /// `disabled` attribute.
    pub fn is_enabled(&self) -> bool {
        self.attr("disabled").is_none()
    }

    /// Set or clear the `disabled` attribute.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.remove_attr("disabled");
        } else {
            self.set_attr("disabled", "disabled");
        }
    }

    /// Whether a radio button or checkbox is checked. Always false for
    /// other control types.
    pub fn is_checked(&self) -> bool {
        match self.input_type().as_str() {
            "radio" | "checkbox" => self.attr("checked").is_some(),
            _ => false,
        }
    }

    /// Check or uncheck a radio button or checkbox.
    ///
    /// Fails with [`Error::UnsupportedForm`] on any other control type.
    pub fn set_checked(&mut self, checked: bool) -> Result<(), Error> {
        match self.input_type().as_str() {
            "radio" | "checkbox" => {}
            other => {
                return Err(Error::UnsupportedForm(format!(
                    "only checkboxes and radio buttons can be checked, \
                     not {:?}", other)));
            }
        }
        if checked {
            self.set_attr("checked", "checked");
        } else {
            self.remove_attr("checked");
        }
        Ok(())
    }

    /// An option's value: the `value` attribute if present, else the
    /// element text.
    pub fn option_value(&self) -> String {
        match self.attr("value") {
            Some(v) => v.to_string(),
            None => self.text.to_string(),
        }
    }

    /// Whether an option is selected (presence of the `selected`
    /// attribute).
    pub fn is_selected(&self) -> bool {
        self.attr("selected").is_some()
    }

    /// Select or unselect an option.
    pub fn set_selected(&mut self, selected: bool) {
        if selected {
            self.set_attr("selected", "selected");
        } else {
            self.remove_attr("selected");
        }
    }
}

/// Form semantics.
impl Document {
    /// The form-associated descendants (`input`, `select`, `textarea`) of
    /// the given form, in tree order.
    pub fn form_elements(&self, form: NodeId) -> Vec<NodeId> {
        self.node_ref(form).descendants()
            .filter(|n| {
                n.as_element().map(|e| e.is_form_field()).unwrap_or(false)
            })
            .map(|n| n.id())
            .collect()
    }

    /// The form's submit method: `"POST"`, or `"GET"` for anything else
    /// (including a missing or malformed `method` attribute).
    pub fn form_method(&self, form: NodeId) -> &'static str {
        let post = self[form].attr("method")
            .map(|m| m.as_ref().eq_ignore_ascii_case("POST"))
            .unwrap_or(false);
        if post { "POST" } else { "GET" }
    }

    /// The descendant `<option>` elements of a select, in tree order.
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.node_ref(select).descendants()
            .filter(|n| n.is_elem(local_name!("option")))
            .map(|n| n.id())
            .collect()
    }

    /// The values of all currently selected options, in tree order.
    pub fn selected_values(&self, select: NodeId) -> Vec<String> {
        self.options(select).iter()
            .map(|&o| self[o].as_element().expect("option element"))
            .filter(|e| e.is_selected())
            .map(|e| e.option_value())
            .collect()
    }

    /// Select every option whose value is in `values` and unselect the
    /// rest.
    ///
    /// Fails with [`Error::UnsupportedForm`] if any given value is not
    /// among the available options; several options sharing a value are all
    /// selected.
    pub fn set_selected(&mut self, select: NodeId, values: &[&str])
        -> Result<(), Error>
    {
        let options = self.options(select);
        for &v in values {
            let available = options.iter().any(|&o| {
                self[o].as_element().expect("option element")
                    .option_value() == v
            });
            if !available {
                return Err(Error::UnsupportedForm(format!(
                    "option value {:?} is not available in this <select>",
                    v)));
            }
        }
        for o in options {
            let elm = self[o].as_element_mut().expect("option element");
            let keep = values.contains(&elm.option_value().as_str());
            elm.set_selected(keep);
        }
        Ok(())
    }

    /// A select's value.
    ///
    /// The value of the uniquely selected option; with none selected, the
    /// first option's value, or empty with no options at all (what browsers
    /// return). More than one selected option is
    /// [`Error::UnsupportedForm`].
    pub fn select_value(&self, select: NodeId) -> Result<String, Error> {
        let selected = self.selected_values(select);
        match selected.len() {
            1 => Ok(selected.into_iter().next().expect("len checked")),
            0 => {
                Ok(self.options(select).first()
                    .map(|&o| {
                        self[o].as_element().expect("option element")
                            .option_value()
                    })
                    .unwrap_or_default())
            }
            _ => Err(Error::UnsupportedForm(
                "more than one <option> is selected".to_owned())),
        }
    }

    /// Retrieve the value associated with the given field name.
    ///
    /// A radio group yields the value of the uniquely checked member, or
    /// `None` when none is checked. A select yields its
    /// [`Document::select_value`]. Any other single control yields its
    /// value.
    ///
    /// Fails with [`Error::InputNotFound`] for an unknown name, and
    /// [`Error::UnsupportedForm`] for duplicate non-radio names, multiple
    /// checked radios, or multiple selected options.
    pub fn field(&self, form: NodeId, name: &str)
        -> Result<Option<String>, Error>
    {
        let inputs = self.named_fields(form, name);
        if inputs.len() > 1 {
            self.radio_group(name, &inputs)?;
            let checked: Vec<&Element> = inputs.iter()
                .map(|&id| self[id].as_element().expect("form field"))
                .filter(|e| e.is_checked())
                .collect();
            match checked.len() {
                0 => Ok(None),
                1 => Ok(Some(checked[0].input_value())),
                _ => Err(Error::UnsupportedForm(format!(
                    "multiple radio buttons with name {:?} are checked",
                    name))),
            }
        } else if let Some(&id) = inputs.first() {
            if self[id].is_elem(local_name!("select")) {
                Ok(Some(self.select_value(id)?))
            } else {
                Ok(Some(
                    self[id].as_element().expect("form field").input_value()))
            }
        } else {
            Err(Error::InputNotFound(name.to_owned()))
        }
    }

    /// Set the value associated with the given field name.
    ///
    /// In a radio group, the member whose `value` attribute matches is
    /// checked and the rest unchecked. A select delegates to
    /// [`Document::set_selected`] with the single value. Any other single
    /// control is assigned directly.
    ///
    /// Fails with [`Error::InputNotFound`] for an unknown name, and
    /// [`Error::UnsupportedForm`] for duplicate non-radio names, a radio
    /// group without the value, or a select without a matching option.
    pub fn set_field(&mut self, form: NodeId, name: &str, value: &str)
        -> Result<(), Error>
    {
        let inputs = self.named_fields(form, name);
        if inputs.len() > 1 {
            self.radio_group(name, &inputs)?;
            let target = inputs.iter().copied().find(|&id| {
                self[id].attr("value").map(|v| v.as_ref() == value)
                    .unwrap_or(false)
            });
            let target = target.ok_or_else(|| Error::UnsupportedForm(
                format!("no radio button with value {:?} exists", value)))?;
            for id in inputs {
                self[id].as_element_mut().expect("form field")
                    .remove_attr("checked");
            }
            self[target].as_element_mut().expect("form field")
                .set_attr("checked", "checked");
            Ok(())
        } else if let Some(&id) = inputs.first() {
            if self[id].is_elem(local_name!("select")) {
                self.set_selected(id, &[value])
            } else {
                self[id].as_element_mut().expect("form field")
                    .set_input_value(value);
                Ok(())
            }
        } else {
            Err(Error::InputNotFound(name.to_owned()))
        }
    }

    /// Collect the form data as ordered (name, value) pairs, as submission
    /// would send them.
    ///
    /// Disabled and unnamed controls are skipped; radio buttons and
    /// checkboxes contribute only when checked; a select contributes one
    /// pair per selected option.
    pub fn form_data(&self, form: NodeId) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for id in self.form_elements(form) {
            let elm = self[id].as_element().expect("form field");
            if !elm.is_enabled() {
                continue;
            }
            let name = match elm.input_name() {
                Some(n) if !n.is_empty() => n.to_owned(),
                _ => continue,
            };
            match elm.input_type().as_str() {
                "radio" | "checkbox" => {
                    if elm.is_checked() {
                        pairs.push((name, elm.input_value()));
                    }
                }
                "select" => {
                    for value in self.selected_values(id) {
                        pairs.push((name.clone(), value));
                    }
                }
                _ => {
                    pairs.push((name, elm.input_value()));
                }
            }
        }
        pairs
    }

    fn named_fields(&self, form: NodeId, name: &str) -> Vec<NodeId> {
        self.form_elements(form).into_iter()
            .filter(|&id| {
                self[id].as_element().expect("form field")
                    .input_name() == Some(name)
            })
            .collect()
    }

    /// Guard that a same-named set of controls is entirely radio buttons.
    fn radio_group(&self, name: &str, inputs: &[NodeId])
        -> Result<(), Error>
    {
        let all_radio = inputs.iter().all(|&id| {
            self[id].as_element().expect("form field")
                .input_type() == "radio"
        });
        if all_radio {
            Ok(())
        } else {
            Err(Error::UnsupportedForm(format!(
                "found multiple elements for name {:?}, and they are not \
                 all radio buttons", name)))
        }
    }
}

/// The urlencoded escape set: everything but ASCII alphanumerics and
/// `_.-~`. Space stays literal here and becomes `+` afterwards.
const FORM_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_').remove(b'.').remove(b'-').remove(b'~').remove(b' ');

/// Serialize (name, value) pairs as `application/x-www-form-urlencoded`
/// bytes-in-a-string, encoding characters through the given form charset.
///
/// Characters unmappable in the form charset become numeric character
/// references before percent escaping, as browsers submit them.
pub(crate) fn urlencoded(
    pairs: &[(String, String)],
    encoding: &'static enc::Encoding)
    -> String
{
    let mut out = String::new();
    for (name, value) in pairs {
        if !out.is_empty() {
            out.push('&');
        }
        push_escaped(&mut out, name, encoding);
        out.push('=');
        push_escaped(&mut out, value, encoding);
    }
    out
}

fn push_escaped(out: &mut String, text: &str, encoding: &'static enc::Encoding)
{
    let (bytes, _, _) = encoding.encode(text);
    let escaped: String = percent_encode(&bytes, FORM_ESCAPE).collect();
    // percent_encode left the space we excluded from the set
    out.push_str(&escaped.replace(' ', "+"));
}

#[cfg(test)]
mod tests {
    use encoding_rs as enc;

    use crate::dom::html::{parse_fragment, parse_str};
    use crate::dom::{Document, NodeId};
    use crate::error::Error;
    use crate::logger::ensure_logger;
    use super::urlencoded;

    fn form_doc(inner: &str) -> (Document, NodeId) {
        let doc = parse_str(&format!("<form>{}</form>", inner));
        let form = doc.children(doc.root_element().unwrap()).next().unwrap();
        (doc, form)
    }

    #[test]
    fn element_accessors() {
        ensure_logger();
        let doc = parse_fragment("<input name=foo TYPE=Radio>");
        let root = doc.root_element().unwrap();
        let elm = doc[root].as_element().unwrap();
        assert!(elm.is_form_field());
        assert_eq!(Some("foo"), elm.input_name());
        assert_eq!("radio", elm.input_type());
        assert_eq!("on", elm.input_value(), "radio value defaults to on");
        assert!(elm.is_enabled());
        assert!(!elm.is_checked());

        let doc = parse_fragment("<input>");
        let root = doc.root_element().unwrap();
        let elm = doc[root].as_element().unwrap();
        assert_eq!("text", elm.input_type());
        assert_eq!("", elm.input_value());
        assert_eq!(None, elm.input_name());
    }

    #[test]
    fn textarea_value_is_text() {
        ensure_logger();
        let mut doc = parse_fragment("<textarea name=baz>hohoho</textarea>");
        let root = doc.root_element().unwrap();
        assert_eq!("textarea", doc[root].as_element().unwrap().input_type());
        assert_eq!("hohoho", doc[root].as_element().unwrap().input_value());

        doc[root].as_element_mut().unwrap().set_input_value("replaced");
        assert_eq!("replaced", doc[root].as_element().unwrap().text.as_ref());
        assert_eq!(None, doc[root].attr("value"));
    }

    #[test]
    fn option_values() {
        ensure_logger();
        let doc = parse_fragment("<option value=foo>bar</option>");
        let root = doc.root_element().unwrap();
        assert_eq!("foo", doc[root].as_element().unwrap().option_value());

        let doc = parse_fragment("<option>bar</option>");
        let root = doc.root_element().unwrap();
        let elm = doc[root].as_element().unwrap();
        assert_eq!("bar", elm.option_value());
        assert!(!elm.is_selected());
    }

    #[test]
    fn checked_only_for_check_capable() {
        ensure_logger();
        let mut doc = parse_fragment("<input type=text name=a>");
        let root = doc.root_element().unwrap();
        match doc[root].as_element_mut().unwrap().set_checked(true) {
            Err(Error::UnsupportedForm(_)) => {}
            other => panic!("expected UnsupportedForm, got {:?}",
                other.map(|_| ())),
        }

        let mut doc = parse_fragment("<input type=checkbox name=a>");
        let root = doc.root_element().unwrap();
        doc[root].as_element_mut().unwrap().set_checked(true).unwrap();
        assert_eq!("checked", doc[root].attr("checked").unwrap().as_ref());
        doc[root].as_element_mut().unwrap().set_checked(false).unwrap();
        assert_eq!(None, doc[root].attr("checked"));
    }

    #[test]
    fn form_elements_in_tree_order() {
        ensure_logger();
        let (doc, form) = form_doc(
            "<div><input name=a></div>\
             <select name=b></select>\
             <p><textarea name=c></textarea></p>\
             <button name=ignored></button>");
        let names: Vec<String> = doc.form_elements(form).iter()
            .map(|&id| {
                doc[id].as_element().unwrap().input_name()
                    .unwrap().to_owned()
            })
            .collect();
        assert_eq!(vec!["a", "b", "c"], names);
    }

    #[test]
    fn field_single_values() {
        ensure_logger();
        let (doc, form) = form_doc(
            "<input name=a value=bar>\
             <textarea name=b>text</textarea>\
             <select name=c><option selected>x<option>y</select>");
        assert_eq!(Some("bar".to_owned()), doc.field(form, "a").unwrap());
        assert_eq!(Some("text".to_owned()), doc.field(form, "b").unwrap());
        assert_eq!(Some("x".to_owned()), doc.field(form, "c").unwrap());

        match doc.field(form, "nope") {
            Err(Error::InputNotFound(name)) => assert_eq!("nope", name),
            other => panic!("expected InputNotFound, got {:?}",
                other.map(|_| ())),
        }
    }

    #[test]
    fn field_radio_groups() {
        ensure_logger();
        let (doc, form) = form_doc(
            "<input type=radio name=r value=a>\
             <input type=radio name=r value=b checked>\
             <input type=radio name=r value=c>");
        assert_eq!(Some("b".to_owned()), doc.field(form, "r").unwrap());

        // none checked reads as null, not an error
        let (doc, form) = form_doc(
            "<input type=radio name=r value=a>\
             <input type=radio name=r value=b>");
        assert_eq!(None, doc.field(form, "r").unwrap());

        // several checked is ambiguous
        let (doc, form) = form_doc(
            "<input type=radio name=r value=a checked>\
             <input type=radio name=r value=b checked>");
        assert!(matches!(
            doc.field(form, "r"), Err(Error::UnsupportedForm(_))));

        // duplicate names that are not all radios are ambiguous
        let (doc, form) = form_doc(
            "<input type=radio name=r value=a>\
             <input type=text name=r>");
        assert!(matches!(
            doc.field(form, "r"), Err(Error::UnsupportedForm(_))));
    }

    #[test]
    fn set_field_radio_group() {
        ensure_logger();
        let (mut doc, form) = form_doc(
            "<input type=radio name=r value=a checked>\
             <input type=radio name=r value=b>");
        doc.set_field(form, "r", "b").unwrap();
        assert_eq!(Some("b".to_owned()), doc.field(form, "r").unwrap());

        let checked: Vec<bool> = doc.form_elements(form).iter()
            .map(|&id| doc[id].as_element().unwrap().is_checked())
            .collect();
        assert_eq!(vec![false, true], checked);

        assert!(matches!(
            doc.set_field(form, "r", "zzz"),
            Err(Error::UnsupportedForm(_))));
    }

    #[test]
    fn set_field_single_inputs() {
        ensure_logger();
        let (mut doc, form) = form_doc(
            "<input name=a value=old>\
             <textarea name=b>old</textarea>\
             <select name=c><option>x<option>y</select>");
        doc.set_field(form, "a", "new").unwrap();
        doc.set_field(form, "b", "lines").unwrap();
        doc.set_field(form, "c", "y").unwrap();

        assert_eq!(Some("new".to_owned()), doc.field(form, "a").unwrap());
        assert_eq!(Some("lines".to_owned()), doc.field(form, "b").unwrap());
        assert_eq!(Some("y".to_owned()), doc.field(form, "c").unwrap());

        assert!(matches!(
            doc.set_field(form, "c", "zzz"),
            Err(Error::UnsupportedForm(_))));
        assert!(matches!(
            doc.set_field(form, "none", "x"),
            Err(Error::InputNotFound(_))));
    }

    #[test]
    fn set_field_is_idempotent() {
        ensure_logger();
        let (mut doc, form) = form_doc(
            "<input name=a value=old>\
             <input type=radio name=r value=a>\
             <input type=radio name=r value=b checked>");
        doc.set_field(form, "a", "v").unwrap();
        doc.set_field(form, "r", "a").unwrap();
        let first = urlencoded(&doc.form_data(form), enc::UTF_8);
        doc.set_field(form, "a", "v").unwrap();
        doc.set_field(form, "r", "a").unwrap();
        let second = urlencoded(&doc.form_data(form), enc::UTF_8);
        assert_eq!(first, second);
        assert_eq!("a=v&r=a", first);
    }

    #[test]
    fn select_value_rules() {
        ensure_logger();
        let (doc, form) = form_doc(
            "<select name=s><option value=1>one<option value=2>two</select>");
        let select = doc.form_elements(form)[0];
        assert_eq!(
            "1", doc.select_value(select).unwrap(),
            "none selected falls back to the first option");

        let (doc, form) = form_doc("<select name=s></select>");
        let select = doc.form_elements(form)[0];
        assert_eq!("", doc.select_value(select).unwrap());

        let (doc, form) = form_doc(
            "<select name=s>\
             <option selected>a<option>b<option selected>c</select>");
        let select = doc.form_elements(form)[0];
        assert_eq!(
            vec!["a", "c"],
            doc.selected_values(select));
        assert!(matches!(
            doc.select_value(select), Err(Error::UnsupportedForm(_))));
    }

    #[test]
    fn set_selected_marks_all_matches() {
        ensure_logger();
        let (mut doc, form) = form_doc(
            "<select name=s>\
             <option selected>a<option>b<option selected>c</select>");
        let select = doc.form_elements(form)[0];
        doc.set_selected(select, &["a", "b"]).unwrap();
        let flags: Vec<bool> = doc.options(select).iter()
            .map(|&o| doc[o].as_element().unwrap().is_selected())
            .collect();
        assert_eq!(vec![true, true, false], flags);

        // duplicate values are all selected
        let (mut doc, form) = form_doc(
            "<select name=s>\
             <option value=v>one<option value=v>two</select>");
        let select = doc.form_elements(form)[0];
        doc.set_selected(select, &["v"]).unwrap();
        let flags: Vec<bool> = doc.options(select).iter()
            .map(|&o| doc[o].as_element().unwrap().is_selected())
            .collect();
        assert_eq!(vec![true, true], flags);

        assert!(matches!(
            doc.set_selected(select, &["bogus"]),
            Err(Error::UnsupportedForm(_))));
    }

    #[test]
    fn form_data_collection() {
        ensure_logger();
        let (doc, form) = form_doc(
            "<input name=a value=1>\
             <input name=skip value=x disabled>\
             <input value=unnamed>\
             <input type=checkbox name=c checked>\
             <input type=checkbox name=d>\
             <select name=s multiple>\
             <option selected>o1<option>o2<option selected value=v>o3\
             </select>\
             <textarea name=t>body</textarea>");
        assert_eq!(
            vec![
                ("a".to_owned(), "1".to_owned()),
                ("c".to_owned(), "on".to_owned()),
                ("s".to_owned(), "o1".to_owned()),
                ("s".to_owned(), "v".to_owned()),
                ("t".to_owned(), "body".to_owned()),
            ],
            doc.form_data(form));
    }

    #[test]
    fn urlencoded_utf8() {
        ensure_logger();
        // the reference submission: a non-ASCII text field, a checked
        // radio, and a multi-select with two selected options
        let (mut doc, form) = form_doc(
            "<input name=name>\
             <input type=radio name=b checked>\
             <select name=b multiple>\
             <option selected>a<option>b<option selected>c</select>");
        doc.set_field(form, "name", "M\u{fc}\u{df}t\u{e9}rma\u{f1}").unwrap();
        let query = urlencoded(&doc.form_data(form), enc::UTF_8);
        assert_eq!(
            "name=M%C3%BC%C3%9Ft%C3%A9rma%C3%B1&b=on&b=a&b=c",
            query);
    }

    #[test]
    fn urlencoded_spaces_and_reserved() {
        ensure_logger();
        let pairs = vec![
            ("a b".to_owned(), "c+d&e=f".to_owned()),
            ("t".to_owned(), "1~2.3-4_5".to_owned()),
        ];
        assert_eq!(
            "a+b=c%2Bd%26e%3Df&t=1~2.3-4_5",
            urlencoded(&pairs, enc::UTF_8));
    }

    #[test]
    fn urlencoded_legacy_charset() {
        ensure_logger();
        let pairs = vec![("a".to_owned(), "\u{e4}\u{3b2}".to_owned())];
        // ä maps into windows-1252; β becomes a numeric character
        // reference, as browsers submit unmappables
        assert_eq!(
            "a=%E4%26%23946%3B",
            urlencoded(&pairs, enc::WINDOWS_1252));
    }

    #[test]
    fn form_method_normalised() {
        ensure_logger();
        let cases = [
            ("<form>", "GET"),
            ("<form method=post>", "POST"),
            ("<form method=PoSt>", "POST"),
            ("<form method=put>", "GET"),
            ("<form method=get>", "GET"),
        ];
        for (html, expected) in &cases {
            let doc = parse_str(html);
            let form = doc.children(doc.root_element().unwrap())
                .next().unwrap();
            assert_eq!(*expected, doc.form_method(form), "for {}", html);
        }
    }
}
