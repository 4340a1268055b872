use crate::command::{DirectiveFactory, ExecutableDirective, Pattern, Runtime};
use crate::ghost;
use crate::interpreter::Factory;
use crate::rating;
use crate::store::Resource;
use crate::subscription;
use anyhow::Result;
use std::io::{self, Write};
use tracing::{info, warn};

/// Directives known to the runtime at compile time.
///
/// Each one is matched against the text following the `msx` keyword and
/// executed in-process.
pub(crate) trait BuiltinDirective: Sized {
    /// How the directive text is recognised.
    fn pattern() -> Pattern;

    /// Build the directive from the full text after the keyword.
    fn parse(text: &str) -> Self;

    /// Executes the directive against the runtime, writing messages to `out`.
    fn execute(self, runtime: &mut Runtime, out: &mut dyn Write) -> Result<()>;
}

impl<T: BuiltinDirective> ExecutableDirective for T {
    fn execute(self: Box<Self>, runtime: &mut Runtime, out: &mut dyn Write) -> io::Result<()> {
        match <T as BuiltinDirective>::execute(*self, runtime, out) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %format!("{:#}", e), "directive failed");
                writeln!(out, "Error: {:#}", e)
            }
        }
    }
}

impl<T: BuiltinDirective + 'static> DirectiveFactory for Factory<T> {
    fn try_create(&self, text: &str) -> Option<Box<dyn ExecutableDirective>> {
        if T::pattern().matches(text) {
            Some(Box::new(T::parse(text)))
        } else {
            None
        }
    }
}

/// Directives in match priority order.
pub(crate) fn default_directives() -> Vec<Box<dyn DirectiveFactory>> {
    vec![
        Box::new(Factory::<Help>::default()),
        Box::new(Factory::<ExportCommandsList>::default()),
        Box::new(Factory::<Commands>::default()),
        Box::new(Factory::<Terminal>::default()),
        Box::new(Factory::<DoubleClick>::default()),
        Box::new(Factory::<SignCommands>::default()),
        Box::new(Factory::<ExtensionImport>::default()),
        Box::new(Factory::<ImportAll>::default()),
        Box::new(Factory::<Rate>::default()),
        Box::new(Factory::<SubscriptionCheck>::default()),
        Box::new(Factory::<Subscribe>::default()),
        Box::new(Factory::<Restart>::default()),
        Box::new(Factory::<CreateSubscriptionManager>::default()),
    ]
}

/// Declares a directive that only prints a fixed message.
macro_rules! notice_directive {
    ($(#[$meta:meta])* $name:ident, $text:literal, $message:expr) => {
        $(#[$meta])*
        pub struct $name;

        impl BuiltinDirective for $name {
            fn pattern() -> Pattern {
                Pattern::Exact($text)
            }

            fn parse(_text: &str) -> Self {
                $name
            }

            fn execute(self, _runtime: &mut Runtime, out: &mut dyn Write) -> Result<()> {
                writeln!(out, "{}", $message)?;
                Ok(())
            }
        }
    };
}

const HELP_TEXT: &str = "\
MSX Help: list of commands...
  msx help                              show this help
  msx commands                          list commands
  msx export commands list              export the command list
  msx terminal                          open the terminal
  msx double click file commands        run the double_click ghost commands
  msx sign commands                     run sign commands
  msx extension import from file <f>    import an extension from a file
  msx rate                              rate this extension (1-5)
  msx subscribe [hours]                 subscribe for 15-72 hours (default 24)
  msx subscription check                show the remaining subscription time
  msx restart                           clear subscription and ratings
  msx create custom subscriptions manager
                                        write a subscription manager script";

notice_directive!(
    /// `msx help`
    Help,
    "help",
    HELP_TEXT
);
notice_directive!(
    /// `msx export commands list`
    ExportCommandsList,
    "export commands list",
    "Exporting commands list..."
);
notice_directive!(
    /// `msx commands`
    Commands,
    "commands",
    "Listing MSX commands..."
);
notice_directive!(
    /// `msx terminal`
    Terminal,
    "terminal",
    "Opening MSX terminal..."
);
notice_directive!(
    /// `msx sign commands`
    SignCommands,
    "sign commands",
    "Running sign commands..."
);
notice_directive!(
    /// `msx import all modules including ...`
    ImportAll,
    "import all modules including .js .msx .py .jsx .tsx .json .ts",
    "Importing all modules..."
);

/// Fire the `double_click` ghost commands.
pub struct DoubleClick;

impl BuiltinDirective for DoubleClick {
    fn pattern() -> Pattern {
        Pattern::Exact("double click file commands")
    }

    fn parse(_text: &str) -> Self {
        DoubleClick
    }

    fn execute(self, runtime: &mut Runtime, out: &mut dyn Write) -> Result<()> {
        ghost::dispatch(runtime.store.as_mut(), ghost::DOUBLE_CLICK, out)?;
        Ok(())
    }
}

/// `msx extension import from file <name>`; the last word names the file.
pub struct ExtensionImport {
    pub file: String,
}

impl BuiltinDirective for ExtensionImport {
    fn pattern() -> Pattern {
        Pattern::Prefix("extension import from file")
    }

    fn parse(text: &str) -> Self {
        let file = text.split_whitespace().last().unwrap_or_default();
        ExtensionImport {
            file: file.to_string(),
        }
    }

    fn execute(self, _runtime: &mut Runtime, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "Importing extension from {}...", self.file)?;
        Ok(())
    }
}

/// Ask for a 1-5 rating.
pub struct Rate;

impl BuiltinDirective for Rate {
    fn pattern() -> Pattern {
        Pattern::Exact("rate")
    }

    fn parse(_text: &str) -> Self {
        Rate
    }

    fn execute(self, runtime: &mut Runtime, out: &mut dyn Write) -> Result<()> {
        rating::rate(runtime.store.as_mut(), runtime.prompt.as_mut(), out)?;
        Ok(())
    }
}

pub struct SubscriptionCheck;

impl BuiltinDirective for SubscriptionCheck {
    fn pattern() -> Pattern {
        Pattern::Exact("subscription check")
    }

    fn parse(_text: &str) -> Self {
        SubscriptionCheck
    }

    fn execute(self, runtime: &mut Runtime, out: &mut dyn Write) -> Result<()> {
        subscription::check(runtime.store.as_mut(), runtime.clock.as_ref(), out)?;
        Ok(())
    }
}

/// `msx subscribe [hours]`
pub struct Subscribe {
    pub duration_hours: i64,
    /// Token that was given but is not a number.
    pub rejected: Option<String>,
}

impl BuiltinDirective for Subscribe {
    fn pattern() -> Pattern {
        Pattern::Prefix("subscribe")
    }

    fn parse(text: &str) -> Self {
        let (duration_hours, rejected) =
            subscription::parse_duration(text.split_whitespace().nth(1));
        Subscribe {
            duration_hours,
            rejected,
        }
    }

    fn execute(self, runtime: &mut Runtime, out: &mut dyn Write) -> Result<()> {
        if let Some(token) = &self.rejected {
            warn!(token = %token, "bad subscription duration");
            writeln!(
                out,
                "Invalid duration '{}', defaulting to {} hours.",
                token,
                subscription::DEFAULT_DURATION_HOURS
            )?;
        }
        subscription::subscribe(
            runtime.store.as_mut(),
            runtime.clock.as_ref(),
            self.duration_hours,
            out,
        )?;
        Ok(())
    }
}

pub struct Restart;

impl BuiltinDirective for Restart {
    fn pattern() -> Pattern {
        Pattern::Exact("restart")
    }

    fn parse(_text: &str) -> Self {
        Restart
    }

    fn execute(self, runtime: &mut Runtime, out: &mut dyn Write) -> Result<()> {
        subscription::reset(runtime.store.as_mut(), out)
    }
}

/// Script written by `msx create custom subscriptions manager`.
pub const SUBSCRIPTION_MANAGER_TEMPLATE: &str = "\
# subscription manager bot
function manage_subscriptions(user) {
    print \"Checking subscription rules for $user...\"
}
";

pub struct CreateSubscriptionManager;

impl BuiltinDirective for CreateSubscriptionManager {
    fn pattern() -> Pattern {
        Pattern::Exact("create custom subscriptions manager")
    }

    fn parse(_text: &str) -> Self {
        CreateSubscriptionManager
    }

    fn execute(self, runtime: &mut Runtime, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "Creating custom subscription manager...")?;
        runtime
            .store
            .save(Resource::SubscriptionManager, SUBSCRIPTION_MANAGER_TEMPLATE)?;
        let name = runtime.store.describe(Resource::SubscriptionManager);
        info!(file = %name, "subscription manager created");
        writeln!(out, "Subscription manager created: {}", name)?;
        Ok(())
    }
}
