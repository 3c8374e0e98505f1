use crate::error::{StudioError, StudioResult};

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Template {
    pub name: &'static str,
    pub label: &'static str,
    pub value: &'static str,
}

pub const TEMPLATES: [Template; 5] = [
    Template { name: "wifi", label: "WiFi Network", value: "WIFI:T:WPA;S:NetworkName;P:Password;H:false;;" },
    Template { name: "email", label: "Email", value: "mailto:example@email.com?subject=Hello&body=Message" },
    Template { name: "phone", label: "Phone", value: "tel:+1234567890" },
    Template { name: "sms", label: "SMS", value: "sms:+1234567890?body=Hello" },
    Template { name: "website", label: "Website", value: "https://example.com" },
];

/// Looks a template up by short name or label, ignoring case.
pub fn find(name: &str) -> StudioResult<&'static Template> {
    TEMPLATES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name) || t.label.eq_ignore_ascii_case(name))
        .ok_or_else(|| StudioError::UnknownTemplate(name.to_string()))
}
