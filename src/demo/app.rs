//! Sign-up screen state and key handling

use super::input::{InputProps, RenderedInput, TextInput};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use form_ctrl::binding::{
    with_form_controlled, FieldProps, MountedControlledField, WithFormParams,
};
use form_ctrl::config::DemoConfig;
use form_ctrl::ctrl::{BlurEvent, ChangeEvent, FieldId, FieldMessage, FieldValidation, FormId};
use form_ctrl::{FormCtrl, UseForm, UseFormOptions};
use serde::Deserialize;
use std::rc::Rc;

pub const FORM_ID: &str = "signup";

struct FieldSpec {
    id: &'static str,
    label: &'static str,
    required: bool,
    masked: bool,
    max_len: usize,
}

const FIELDS: [FieldSpec; 3] = [
    FieldSpec {
        id: "email",
        label: "Email",
        required: true,
        masked: false,
        max_len: 64,
    },
    FieldSpec {
        id: "name",
        label: "Name",
        required: false,
        masked: false,
        max_len: 40,
    },
    FieldSpec {
        id: "password",
        label: "Password",
        required: true,
        masked: true,
        max_len: 32,
    },
];

#[derive(Debug, Deserialize)]
struct Signup {
    email: String,
    #[serde(default)]
    name: String,
    password: String,
}

/// One input on the screen and its cached render output
pub struct BoundField {
    pub id: FieldId,
    label: &'static str,
    masked: bool,
    max_len: usize,
    mounted: MountedControlledField<TextInput>,
    rendered: Option<RenderedInput>,
    rendered_active: bool,
    pub renders: u32,
}

impl BoundField {
    fn new(spec: &FieldSpec) -> Self {
        let mut params = WithFormParams::new()
            .form(FORM_ID)
            .field(spec.id)
            .required(spec.required);
        if let Some(validation) = validation_for(spec.id) {
            params = params.validation(Rc::new(validation));
        }
        if spec.id == "email" {
            params = params.messages(Rc::new(vec![FieldMessage::info("We never share it")]));
        }

        Self {
            id: FieldId::from(spec.id),
            label: spec.label,
            masked: spec.masked,
            max_len: spec.max_len,
            mounted: with_form_controlled(TextInput, params).mount(),
            rendered: None,
            rendered_active: false,
            renders: 0,
        }
    }

    /// Re-render when the field changed or focus moved onto or off it
    fn refresh(&mut self, active: bool) {
        if self.rendered.is_some()
            && self.rendered_active == active
            && !self.mounted.needs_render()
        {
            return;
        }
        let max_len = self.max_len;
        let props = FieldProps::new(InputProps {
            label: self.label,
            active,
            masked: self.masked,
        })
        .on_change(move |event: &ChangeEvent| {
            let len = event.value.as_str().map_or(0, |s| s.chars().count());
            if len > max_len {
                anyhow::bail!("at most {max_len} characters");
            }
            Ok(())
        });
        self.rendered = Some(self.mounted.render(props));
        self.rendered_active = active;
        self.renders += 1;
    }

    pub fn widget(&self) -> Option<&ratatui::widgets::Paragraph<'static>> {
        self.rendered.as_ref().map(|r| &r.widget)
    }
}

fn validation_for(field: &str) -> Option<FieldValidation> {
    match field {
        "email" => Some(FieldValidation::default().with_validator(|value, _| {
            value
                .as_str()
                .filter(|s| !s.is_empty() && !s.contains('@'))
                .map(|_| FieldMessage::error("Not an email address"))
        })),
        "password" => Some(FieldValidation::default().with_validator(|value, _| {
            value
                .as_str()
                .filter(|s| !s.is_empty() && s.chars().count() < 8)
                .map(|_| FieldMessage::warning("Short passwords are easy to guess"))
        })),
        _ => None,
    }
}

/// The sign-up screen
pub struct DemoApp {
    hook: UseForm,
    form_id: FormId,
    options: UseFormOptions,
    form: Option<FormCtrl>,
    fields: Vec<BoundField>,
    active: usize,
    status: Option<String>,
    quit: bool,
}

impl DemoApp {
    pub fn new(config: &DemoConfig) -> Self {
        let mut app = Self {
            hook: UseForm::new(),
            form_id: FormId::from(FORM_ID),
            options: config.use_form_options(),
            form: None,
            fields: Vec::new(),
            active: 0,
            status: None,
            quit: false,
        };
        // The form must exist before the fields resolve it by id
        app.refresh();
        app.fields = FIELDS.iter().map(BoundField::new).collect();
        app.refresh();
        app
    }

    /// One render pass over the screen
    pub fn refresh(&mut self) {
        self.form = Some(self.hook.use_form(&self.form_id, &self.options));
        for (index, field) in self.fields.iter_mut().enumerate() {
            field.refresh(index == self.active);
        }
    }

    pub fn fields(&self) -> &[BoundField] {
        &self.fields
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit = true
            }
            KeyCode::Tab => self.move_focus(1),
            KeyCode::BackTab => self.move_focus(self.fields.len() - 1),
            KeyCode::Enter => self.submit(),
            KeyCode::F(5) => self.reset(),
            KeyCode::Backspace => {
                let mut value = self.active_value();
                value.pop();
                self.change(value);
            }
            KeyCode::Char(c) => {
                let mut value = self.active_value();
                value.push(c);
                self.change(value);
            }
            _ => {}
        }
    }

    fn active_value(&self) -> String {
        let field = &self.fields[self.active];
        self.form
            .as_ref()
            .and_then(|form| form.field_data(&field.id))
            .map(|data| data.display_value())
            .unwrap_or_default()
    }

    fn change(&mut self, value: String) {
        let Some(rendered) = &self.fields[self.active].rendered else {
            return;
        };
        match rendered.on_change.call(&ChangeEvent::from(value)) {
            Ok(()) => self.status = None,
            Err(err) => {
                tracing::warn!("change rejected: {err}");
                self.status = Some(format!("Error: {err}"));
            }
        }
    }

    fn move_focus(&mut self, step: usize) {
        if let Some(rendered) = &self.fields[self.active].rendered {
            if let Err(err) = rendered.on_blur.call(&BlurEvent) {
                self.status = Some(format!("Error: {err}"));
            }
        }
        self.active = (self.active + step) % self.fields.len();
    }

    fn submit(&mut self) {
        let Some(form) = &self.form else {
            return;
        };
        if !form.submit() {
            self.status = Some("Fix the highlighted fields".to_string());
            return;
        }
        self.status = Some(match form.values_as::<Signup>() {
            Ok(signup) => {
                tracing::info!("signed up {}", signup.email);
                let name = if signup.name.is_empty() {
                    "anonymous"
                } else {
                    signup.name.as_str()
                };
                format!(
                    "Signed up {name} <{}> with a {}-character password",
                    signup.email,
                    signup.password.chars().count()
                )
            }
            Err(err) => format!("Error: {err}"),
        });
    }

    fn reset(&mut self) {
        if let Some(form) = &self.form {
            form.reset_values(self.options.values.as_deref().cloned().unwrap_or_default());
            self.status = Some("Form reset".to_string());
        }
    }
}
