use std::sync::Arc;

use futures::future::BoxFuture;
use interact_spec::{
    Event, FieldEvent, FieldSpec, FinalEvent, GroupEvent, Params, Predicate, SelectOption,
    Validator, shave_indices,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::autosubmit::autosubmit;
use crate::error::{INTERRUPT_EXIT_CODE, InteractError};
use crate::options::{InteractOptions, RunOptions};
use crate::reader::{LineReader, ReadError, TerminalReader};
use crate::resolve::{
    confirm_answer, effective_default, placeholder_text, select_index, strip_control_sequences,
};
use crate::sink::{EventSink, SinkItem};

/// Field list accepted at construction: a single field or many.
#[derive(Debug, Clone, Default)]
pub struct Fields(Vec<FieldSpec>);

impl From<FieldSpec> for Fields {
    fn from(field: FieldSpec) -> Self {
        Fields(vec![field])
    }
}

impl From<Vec<FieldSpec>> for Fields {
    fn from(fields: Vec<FieldSpec>) -> Self {
        Fields(fields)
    }
}

impl FromIterator<FieldSpec> for Fields {
    fn from_iter<I: IntoIterator<Item = FieldSpec>>(iter: I) -> Self {
        Fields(iter.into_iter().collect())
    }
}

/// One prompt session over a field list.
///
/// The list is consumed by [`Interact::run`]; build a new session for
/// another run.
pub struct Interact {
    header: String,
    fields: Vec<FieldSpec>,
    options: InteractOptions,
    reader: Box<dyn LineReader>,
    exit_on_interrupt: bool,
}

impl Interact {
    /// Creates a session on the process terminal, entering raw mode now.
    pub fn new(
        header: impl Into<String>,
        fields: impl Into<Fields>,
        options: InteractOptions,
    ) -> Result<Self, InteractError> {
        let reader = TerminalReader::new(options.masked, options.theme)?;
        Ok(Self::assemble(header, fields, options, Box::new(reader), true))
    }

    /// Creates a session over an injected reader. Interrupts end the run
    /// without exiting the process unless the options ask for it.
    pub fn with_reader(
        header: impl Into<String>,
        fields: impl Into<Fields>,
        options: InteractOptions,
        reader: impl LineReader + 'static,
    ) -> Self {
        Self::assemble(header, fields, options, Box::new(reader), false)
    }

    fn assemble(
        header: impl Into<String>,
        fields: impl Into<Fields>,
        options: InteractOptions,
        reader: Box<dyn LineReader>,
        terminal: bool,
    ) -> Self {
        let exit_on_interrupt = options.exit_on_interrupt.unwrap_or(terminal);
        Self {
            header: header.into(),
            fields: fields.into().0,
            options,
            reader,
            exit_on_interrupt,
        }
    }

    /// Whether an interrupt terminates the process with status 130.
    pub fn exits_on_interrupt(&self) -> bool {
        self.exit_on_interrupt
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Starts the traversal on the current tokio runtime and returns the
    /// sink its events arrive on.
    pub fn run(self, run: RunOptions) -> EventSink {
        let (tx, rx) = mpsc::channel(self.options.sink_capacity.max(1));
        tokio::spawn(self.drive(run, tx));
        EventSink::new(rx)
    }

    async fn drive(self, run: RunOptions, tx: mpsc::Sender<SinkItem>) {
        let Interact {
            header,
            fields,
            options,
            reader,
            exit_on_interrupt,
        } = self;
        let mut traversal = Traversal {
            reader,
            options,
            tx: tx.clone(),
        };
        let outcome = if run.autosubmit {
            traversal.autosubmit(&fields).await
        } else {
            traversal.start(&header, fields).await
        };
        // The reader owns the terminal; let it go before anyone hears about
        // the outcome.
        drop(traversal);

        match outcome {
            Ok(()) => {
                if tx.send(Ok(Event::Final(FinalEvent { success: true }))).await.is_err() {
                    debug!("event sink dropped before the final event");
                } else {
                    debug!("run completed");
                }
            }
            Err(Halt::SinkClosed) => debug!("event sink dropped; run abandoned"),
            Err(Halt::Failed(err)) => {
                let interrupted = err.is_interrupt();
                debug!(%err, "run aborted");
                if tx.send(Err(err)).await.is_err() {
                    debug!("event sink dropped before the failure was delivered");
                }
                if interrupted && exit_on_interrupt {
                    std::process::exit(INTERRUPT_EXIT_CODE);
                }
            }
        }
    }
}

/// Why a traversal stopped early.
enum Halt {
    SinkClosed,
    Failed(InteractError),
}

impl From<InteractError> for Halt {
    fn from(err: InteractError) -> Self {
        Halt::Failed(err)
    }
}

impl From<ReadError> for Halt {
    fn from(err: ReadError) -> Self {
        Halt::Failed(err.into())
    }
}

/// Index cursor over one nesting level's owned field list. A field stays
/// current until it is fully resolved.
struct FieldQueue {
    fields: Vec<FieldSpec>,
    position: usize,
}

impl FieldQueue {
    fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            position: 0,
        }
    }

    fn current_mut(&mut self) -> Option<&mut FieldSpec> {
        self.fields.get_mut(self.position)
    }

    fn advance(&mut self) {
        self.position += 1;
    }
}

struct Choice {
    label: String,
    params: Params,
}

struct Traversal {
    reader: Box<dyn LineReader>,
    options: InteractOptions,
    tx: mpsc::Sender<SinkItem>,
}

impl Traversal {
    async fn autosubmit(&mut self, fields: &[FieldSpec]) -> Result<(), Halt> {
        let result = autosubmit(fields, &self.options.defaults);
        debug!(fields = result.fields.len(), "autosubmit resolved defaults");
        self.emit(Event::Autosubmit(result)).await
    }

    async fn start(&mut self, header: &str, fields: Vec<FieldSpec>) -> Result<(), Halt> {
        if !header.is_empty() {
            self.write_line(header)?;
        }
        self.walk(fields, Vec::new(), None).await
    }

    fn walk<'a>(
        &'a mut self,
        fields: Vec<FieldSpec>,
        trail: Vec<String>,
        owner: Option<String>,
    ) -> BoxFuture<'a, Result<(), Halt>> {
        Box::pin(async move {
            let mut queue = FieldQueue::new(fields);
            while let Some(field) = queue.current_mut() {
                self.resolve(field, &trail, owner.as_deref()).await?;
                queue.advance();
            }
            Ok(())
        })
    }

    async fn resolve(
        &mut self,
        field: &mut FieldSpec,
        trail: &[String],
        owner: Option<&str>,
    ) -> Result<(), Halt> {
        debug!(field = %field.name, depth = trail.len(), "resolving field");
        let (answer, choice) = loop {
            let default = effective_default(&self.options.defaults, field);
            let (answer, choice) = self.ask(field, default.as_ref()).await?;
            if self.accepts(field, &answer).await? {
                break (answer, choice);
            }
            debug!(field = %field.name, "answer rejected");
            if let Some(msg) = &field.msg {
                self.write_line(msg)?;
            }
        };
        let answer = match answer {
            Value::String(text) => Value::String(strip_control_sequences(&text)),
            other => other,
        };

        // A field named like the group that owns this level re-enters it
        // instead of nesting one level deeper.
        let base = if owner == Some(field.name.as_str()) {
            trail.to_vec()
        } else {
            extend(trail, &field.name)
        };

        if let Some(choice) = choice {
            let trail = extend(&base, &choice.label);
            self.emit(Event::Select(FieldEvent {
                trail: trail.clone(),
                name: choice.label.clone(),
                answer,
                shave: None,
                params: None,
            }))
            .await?;
            if let Some(token) = choice.params.group_token() {
                self.descend(token, trail, field.name.clone(), choice.label)
                    .await?;
            }
            return Ok(());
        }

        if let Some(token) = field.group_token().map(str::to_string) {
            return self
                .descend(&token, base, field.name.clone(), field.name.clone())
                .await;
        }

        if !self.options.masked {
            trace!(field = %field.name, %answer, "field resolved");
        }
        let data = FieldEvent {
            trail: base,
            name: field.name.clone(),
            answer,
            shave: shave_for(field),
            params: field.params.as_ref().map(Params::to_value),
        };
        let event = if field.boolean {
            Event::Confirm(data)
        } else {
            Event::Input(data)
        };
        self.emit(event).await
    }

    async fn ask(
        &mut self,
        field: &FieldSpec,
        default: Option<&Value>,
    ) -> Result<(Value, Option<Choice>), Halt> {
        if let Some(options) = field.select.as_deref() {
            let choice = self.ask_select(field, options).await?;
            return Ok((choice.params.to_value(), Some(choice)));
        }
        if let Some(token) = field.group_token() {
            return Ok((Value::String(token.to_string()), None));
        }

        let text = self.ask_text(field, default).await?;
        let answer = if field.boolean {
            Value::Bool(confirm_answer(&text, default))
        } else if text.is_empty() {
            default
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()))
        } else {
            Value::String(text)
        };
        Ok((answer, None))
    }

    async fn ask_select(
        &mut self,
        field: &FieldSpec,
        options: &[SelectOption],
    ) -> Result<Choice, Halt> {
        if options.is_empty() {
            return Err(InteractError::EmptySelect {
                field: field.name.clone(),
            }
            .into());
        }
        self.write_line(label_of(field))?;
        self.write_notes(field)?;
        for (index, option) in options.iter().enumerate() {
            let mut line = format!("  {index}) {}", option.label(index));
            if let Some(desc) = &option.desc {
                line.push_str(&self.options.theme.dim(&format!(" - {desc}")));
            }
            self.write_line(&line)?;
        }

        let prompt = format!("[0-{}]{} ", options.len() - 1, field.delimiter);
        let text = self.reader.read_line(&prompt, None).await?;
        let index = select_index(&text, options.len());
        if !text.is_empty() && text.trim().parse::<usize>().ok() != Some(index) {
            warn!(field = %field.name, "select answer not a listed index; using option 0");
        }

        let option = &options[index];
        let label = option.label(index);
        let params = option
            .params
            .clone()
            .ok_or_else(|| InteractError::MissingOptionParams {
                field: field.name.clone(),
                option: label.clone(),
            })?;
        Ok(Choice { label, params })
    }

    async fn ask_text(
        &mut self,
        field: &FieldSpec,
        default: Option<&Value>,
    ) -> Result<String, Halt> {
        self.write_notes(field)?;
        let mut prompt = label_of(field).to_string();
        if field.boolean {
            prompt.push(' ');
            prompt.push_str(&self.options.theme.dim("(Yes/No)"));
        }
        prompt.push_str(&field.delimiter);
        prompt.push(' ');
        let placeholder = default.and_then(placeholder_text);
        Ok(self
            .reader
            .read_line(&prompt, placeholder.as_deref())
            .await?)
    }

    async fn accepts(&mut self, field: &mut FieldSpec, answer: &Value) -> Result<bool, Halt> {
        let Some(check) = self.validator(field)? else {
            return Ok(true);
        };
        Ok(check.validate(answer).await)
    }

    /// Returns the field's predicate, compiling a source predicate on first
    /// use and storing the result so retries reuse it.
    fn validator(
        &self,
        field: &mut FieldSpec,
    ) -> Result<Option<Arc<dyn Validator>>, InteractError> {
        let compiled = match &field.validation {
            None => return Ok(None),
            Some(Predicate::Native(check)) => return Ok(Some(Arc::clone(check))),
            Some(Predicate::Source(source)) => {
                let compiler = self.options.compiler.as_ref().ok_or_else(|| {
                    InteractError::MissingPredicateCompiler {
                        field: field.name.clone(),
                    }
                })?;
                debug!(field = %field.name, "compiling predicate source");
                compiler
                    .compile(source)
                    .map_err(|err| InteractError::PredicateCompile {
                        field: field.name.clone(),
                        source: err,
                    })?
            }
        };
        field.validation = Some(Predicate::Native(Arc::clone(&compiled)));
        Ok(Some(compiled))
    }

    /// Brackets a group's children with `enter`/`exit` events named after
    /// the field. `owner` is what a child must be named to re-enter this
    /// level: the field itself, or the chosen label for a select.
    async fn descend(
        &mut self,
        token: &str,
        trail: Vec<String>,
        name: String,
        owner: String,
    ) -> Result<(), Halt> {
        let marker = GroupEvent {
            trail: trail.clone(),
            name,
            answer: Value::String(token.to_string()),
        };
        self.emit(Event::Enter(marker.clone())).await?;
        let children = self.load(token).await?;
        debug!(group = %owner, token, children = children.len(), "entering group");
        self.walk(children, trail, Some(owner)).await?;
        self.emit(Event::Exit(marker)).await
    }

    async fn load(&mut self, token: &str) -> Result<Vec<FieldSpec>, InteractError> {
        let loader =
            self.options
                .loader
                .as_ref()
                .ok_or_else(|| InteractError::MissingGroupLoader {
                    token: token.to_string(),
                })?;
        loader
            .load(token)
            .await
            .map_err(|source| InteractError::Loader {
                token: token.to_string(),
                source,
            })
    }

    fn write_notes(&mut self, field: &FieldSpec) -> Result<(), ReadError> {
        for note in [&field.description, &field.hint].into_iter().flatten() {
            let line = self.options.theme.dim(&format!("  - {note}"));
            self.write_line(&line)?;
        }
        Ok(())
    }

    fn write_line(&mut self, text: &str) -> Result<(), ReadError> {
        self.reader.write(&format!("{text}\n"))
    }

    async fn emit(&mut self, event: Event) -> Result<(), Halt> {
        self.tx
            .send(Ok(event))
            .await
            .map_err(|_| Halt::SinkClosed)
    }
}

fn label_of(field: &FieldSpec) -> &str {
    if field.prompt.is_empty() {
        &field.name
    } else {
        &field.prompt
    }
}

fn extend(trail: &[String], segment: &str) -> Vec<String> {
    let mut next = trail.to_vec();
    next.push(segment.to_string());
    next
}

fn shave_for(field: &FieldSpec) -> Option<Vec<u64>> {
    let raw = field.shave.as_ref()?;
    let indices = shave_indices(raw);
    if indices.is_none() {
        warn!(field = %field.name, "ignoring malformed shave list");
    }
    indices
}
