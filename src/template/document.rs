use std::io::Cursor;
use std::path::Path;

use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};

use super::TemplateError;
use super::fields::{InvoiceField, InvoiceFields};

/// An invoice template held as a flat list of XML events.
///
/// Text nodes are kept verbatim, so serializing an unmodified template gives
/// back its original formatting.
#[derive(Debug, Clone)]
pub struct InvoiceTemplate {
    events: Vec<Event<'static>>,
}

impl InvoiceTemplate {
    /// Load a template from disk and check it for every [`InvoiceField`].
    ///
    /// # Errors
    ///
    /// [`TemplateError::MissingFile`] if `path` does not exist,
    /// [`TemplateError::Xml`] for malformed XML, and
    /// [`TemplateError::FieldNotFound`] for a missing element.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(TemplateError::MissingFile(path.to_path_buf()));
        }
        let xml = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&xml)
    }

    /// Parse a template from a string and check it for every [`InvoiceField`].
    pub fn parse(xml: &str) -> Result<Self, TemplateError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut events = Vec::new();
        let mut depth = 0usize;
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(event) => {
                    match &event {
                        Event::Start(_) => depth += 1,
                        Event::End(_) => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    events.push(event.into_owned());
                }
                Err(e) => {
                    return Err(TemplateError::Xml(format!(
                        "at byte {}: {e}",
                        reader.error_position()
                    )));
                }
            }
        }
        if depth != 0 {
            return Err(TemplateError::Xml(format!(
                "{depth} element(s) left unclosed"
            )));
        }

        let template = Self { events };
        for field in InvoiceField::ALL {
            template.locate(field.scope(), field.local_name())?;
        }
        Ok(template)
    }

    /// Overwrite the text content of `field`.
    pub fn set(&mut self, field: InvoiceField, value: &str) -> Result<(), TemplateError> {
        self.set_local(field.scope(), field.local_name(), value)
    }

    /// Overwrite the text content of the first element named `local_name`,
    /// optionally restricted to descendants of an element named `scope`.
    ///
    /// Child elements of the target are replaced along with its text.
    pub fn set_local(
        &mut self,
        scope: Option<&str>,
        local_name: &str,
        value: &str,
    ) -> Result<(), TemplateError> {
        let start = self.locate(scope, local_name)?;
        let text = Event::Text(BytesText::new(value).into_owned());

        match &self.events[start] {
            Event::Empty(element) => {
                let open = element.clone().into_owned();
                let close = open.to_end().into_owned();
                self.events.splice(
                    start..=start,
                    [Event::Start(open), text, Event::End(close)],
                );
            }
            _ => {
                let end = self.matching_end(start)?;
                self.events.splice(start + 1..end, [text]);
            }
        }
        Ok(())
    }

    /// Write every field of `fields` into the template.
    pub fn fill(&mut self, fields: &InvoiceFields) -> Result<(), TemplateError> {
        for (field, value) in fields.entries() {
            self.set(field, &value)?;
        }
        Ok(())
    }

    /// Current (unescaped) text of `field`.
    pub fn text(&self, field: InvoiceField) -> Result<String, TemplateError> {
        self.text_local(field.scope(), field.local_name())
    }

    /// Current (unescaped) text of the first element named `local_name`.
    ///
    /// Only direct text children are collected.
    pub fn text_local(&self, scope: Option<&str>, local_name: &str) -> Result<String, TemplateError> {
        let start = self.locate(scope, local_name)?;
        if matches!(self.events[start], Event::Empty(_)) {
            return Ok(String::new());
        }
        let end = self.matching_end(start)?;

        let mut out = String::new();
        let mut depth = 0usize;
        for event in &self.events[start + 1..end] {
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth -= 1,
                Event::Text(text) if depth == 0 => {
                    let unescaped = text
                        .unescape()
                        .map_err(|e| TemplateError::Xml(e.to_string()))?;
                    out.push_str(&unescaped);
                }
                Event::CData(data) if depth == 0 => {
                    out.push_str(&String::from_utf8_lossy(data));
                }
                _ => {}
            }
        }
        Ok(out)
    }

    /// Serialize the document, keeping the template's own whitespace.
    pub fn to_xml(&self) -> Result<String, TemplateError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        for event in &self.events {
            writer
                .write_event(event.borrow())
                .map_err(|e| TemplateError::Xml(format!("write error: {e}")))?;
        }
        let buf = writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| TemplateError::Xml(format!("UTF-8 error: {e}")))
    }

    /// Index of the opening (or empty) event of the first matching element.
    fn locate(&self, scope: Option<&str>, local_name: &str) -> Result<usize, TemplateError> {
        let mut path: Vec<Vec<u8>> = Vec::new();
        let in_scope = |path: &[Vec<u8>]| match scope {
            Some(scope) => path.iter().any(|p| p.as_slice() == scope.as_bytes()),
            None => true,
        };

        for (idx, event) in self.events.iter().enumerate() {
            match event {
                Event::Start(e) => {
                    let name = e.local_name();
                    if name.as_ref() == local_name.as_bytes() && in_scope(&path) {
                        return Ok(idx);
                    }
                    path.push(name.as_ref().to_vec());
                }
                Event::Empty(e) => {
                    if e.local_name().as_ref() == local_name.as_bytes() && in_scope(&path) {
                        return Ok(idx);
                    }
                }
                Event::End(_) => {
                    path.pop();
                }
                _ => {}
            }
        }

        Err(TemplateError::FieldNotFound {
            field: match scope {
                Some(scope) => format!("{scope}/{local_name}"),
                None => local_name.to_string(),
            },
        })
    }

    /// Index of the end event closing the element opened at `start`.
    fn matching_end(&self, start: usize) -> Result<usize, TemplateError> {
        let mut depth = 0usize;
        for (offset, event) in self.events[start + 1..].iter().enumerate() {
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => return Ok(start + 1 + offset),
                Event::End(_) => depth -= 1,
                _ => {}
            }
        }
        Err(TemplateError::Xml("unclosed element".into()))
    }
}
