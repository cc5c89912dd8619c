//! Argument templates.

use crate::recipe::Predicate;

/// A toggle value added when its option is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleVariant {
    pub option: String,
    pub value: String,
}

/// One item of an argument template.
#[derive(Debug, Clone)]
pub enum ArgSpec {
    /// A single argument, with placeholders expanded.
    Literal(String),

    /// `<flag><c1><sep><c2>...` over the exclusion set. Omitted when the
    /// set is empty.
    Exclusions { flag: String, separator: String },

    /// `<flag><v1>,<v2>...` from base values plus the variants whose option
    /// is on, e.g. `threading=multi,single`. Omitted when no value applies.
    Toggle {
        flag: String,
        base: Vec<String>,
        variants: Vec<ToggleVariant>,
    },

    /// `then` when the condition holds, else `otherwise`.
    When {
        condition: Predicate,
        then: Vec<ArgSpec>,
        otherwise: Vec<ArgSpec>,
    },

    /// Items emitted only for multi-architecture builds.
    MultiArch(Vec<ArgSpec>),
}

impl ArgSpec {
    pub fn literal(arg: impl Into<String>) -> Self {
        ArgSpec::Literal(arg.into())
    }

    /// Exclusion entry joined with `,`.
    pub fn exclusions(flag: impl Into<String>) -> Self {
        ArgSpec::Exclusions {
            flag: flag.into(),
            separator: ",".to_string(),
        }
    }

    pub fn toggle(flag: impl Into<String>, base: &[&str], variants: &[(&str, &str)]) -> Self {
        ArgSpec::Toggle {
            flag: flag.into(),
            base: base.iter().map(|s| s.to_string()).collect(),
            variants: variants
                .iter()
                .map(|(option, value)| ToggleVariant {
                    option: option.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    pub fn when(condition: Predicate, then: Vec<ArgSpec>) -> Self {
        ArgSpec::When {
            condition,
            then,
            otherwise: Vec::new(),
        }
    }

    pub fn when_else(condition: Predicate, then: Vec<ArgSpec>, otherwise: Vec<ArgSpec>) -> Self {
        ArgSpec::When {
            condition,
            then,
            otherwise,
        }
    }
}

/// How to invoke one external step.
///
/// Every assembled vector starts with the prefix and library-directory
/// flags, followed by `items` in order.
#[derive(Debug, Clone)]
pub struct ArgumentTemplate {
    pub program: String,
    pub prefix_flag: String,
    pub libdir_flag: String,
    pub items: Vec<ArgSpec>,
}

impl ArgumentTemplate {
    /// A template using `--prefix={prefix}` and `--libdir={libdir}`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix_flag: "--prefix={prefix}".to_string(),
            libdir_flag: "--libdir={libdir}".to_string(),
            items: Vec::new(),
        }
    }

    pub fn prefix_flag(mut self, flag: impl Into<String>) -> Self {
        self.prefix_flag = flag.into();
        self
    }

    pub fn libdir_flag(mut self, flag: impl Into<String>) -> Self {
        self.libdir_flag = flag.into();
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.items.push(ArgSpec::Literal(arg.into()));
        self
    }

    pub fn item(mut self, item: ArgSpec) -> Self {
        self.items.push(item);
        self
    }

    pub fn multi_arch(mut self, items: Vec<ArgSpec>) -> Self {
        self.items.push(ArgSpec::MultiArch(items));
        self
    }
}
