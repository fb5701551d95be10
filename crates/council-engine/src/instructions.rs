//! Analysis instructions rendered from MiniJinja templates
//!
//! Every instruction is a common preamble followed by the role's own
//! template, or by the generic template for roles that define none.
//! Available variables: `subject`, `name`, `title`, `price`, `change`,
//! `stage` and `prior_count`.

use crate::error::Result;
use council_core::{AgentDefinition, Catalog, MarketSnapshot};
use minijinja::{Environment, Value, context};
use tracing::warn;

const PREAMBLE: &str = "preamble";
const GENERIC: &str = "generic";

const PREAMBLE_TEMPLATE: &str = "You are the {{ title }} on an equity research council \
analysing {{ name }} ({{ subject }}), part of {{ stage }}. Last price {{ price }}, daily \
change {{ change }}. {% if prior_count > 0 %}Build on the {{ prior_count }} findings the \
council has already produced.{% else %}You are among the first to report, so rely on the \
evidence in front of you.{% endif %}";

const GENERIC_TEMPLATE: &str = "From your perspective as {{ title }}, give a concise \
assessment of {{ name }}: the main opportunities, the main risks and what you would \
monitor next.";

/// Renders the instruction sent with each analysis request
pub struct InstructionBuilder {
    env: Environment<'static>,
}

impl InstructionBuilder {
    /// Compile the preamble, the generic template and every role template in `catalog`
    pub fn new(catalog: &Catalog) -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(PREAMBLE, PREAMBLE_TEMPLATE)?;
        env.add_template(GENERIC, GENERIC_TEMPLATE)?;
        for definition in catalog.iter() {
            if let Some(template) = definition.instruction_template {
                env.add_template(definition.id, template)?;
            }
        }
        Ok(Self { env })
    }

    /// Render the full instruction for one agent
    ///
    /// Never empty: a template that fails to render degrades to plain text.
    pub fn render(
        &self,
        definition: &AgentDefinition,
        snapshot: &MarketSnapshot,
        prior_count: usize,
    ) -> String {
        let ctx = context! {
            subject => snapshot.subject_id,
            name => snapshot.name,
            title => definition.title,
            price => snapshot.price_display(),
            change => snapshot.change_display(),
            stage => definition.stage.to_string(),
            prior_count => prior_count,
        };

        let preamble = self.render_one(PREAMBLE, &ctx).unwrap_or_else(|| {
            format!(
                "You are the {} on an equity research council analysing {} ({}).",
                definition.title, snapshot.name, snapshot.subject_id
            )
        });

        let role_template = if definition.instruction_template.is_some() {
            definition.id
        } else {
            GENERIC
        };
        let body = self
            .render_one(role_template, &ctx)
            .or_else(|| self.render_one(GENERIC, &ctx))
            .unwrap_or_else(|| {
                format!(
                    "Give your assessment of {} as {}.",
                    snapshot.name, definition.title
                )
            });

        format!("{preamble}\n\n{body}")
    }

    fn render_one(&self, name: &str, ctx: &Value) -> Option<String> {
        let rendered = self
            .env
            .get_template(name)
            .and_then(|template| template.render(ctx));
        match rendered {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(template = name, error = %e, "Instruction template failed to render");
                None
            }
        }
    }
}
