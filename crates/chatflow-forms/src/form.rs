use crate::outcome::{with_prompt, Outcome};
use crate::processor::Processor;

/// One step of a form: a processor plus where its value goes in the draft.
trait Field<S>: Send {
    fn process_input(&mut self, input: &str, draft: &mut S) -> Outcome<()>;
    fn default_response(&self) -> String;
    fn reset(&mut self);
}

struct Slot<P, F> {
    processor: P,
    project: F,
}

impl<S, P, F> Field<S> for Slot<P, F>
where
    P: Processor,
    F: Fn(&mut S, P::Output) + Send,
{
    fn process_input(&mut self, input: &str, draft: &mut S) -> Outcome<()> {
        match self.processor.process_input(input) {
            Outcome::Success(value) => {
                (self.project)(draft, value);
                Outcome::Success(())
            }
            Outcome::Retry(msg) => Outcome::Retry(msg),
            Outcome::Cancel => Outcome::Cancel,
        }
    }

    fn default_response(&self) -> String {
        self.processor.default_response()
    }

    fn reset(&mut self) {
        self.processor.reset();
    }
}

type BuildFn<S, T> = Box<dyn Fn(&S) -> Result<T, String> + Send>;

/// Fills an aggregate `T` field by field.
///
/// Each message goes to the field under the cursor only. On success the
/// field's value is projected into the draft `S` and the cursor moves on,
/// replying with the next field's prompt. After the last field, `build`
/// turns the draft into the aggregate; it may still reject it (cross-field
/// checks), which re-prompts the last field.
///
/// Completed fields are never revisited, and the cursor stays on the last
/// field after success, so a caller that rejects the aggregate keeps the user
/// at the final step rather than back at the first.
///
/// ```
/// use chatflow_forms::{leaf, Form, Outcome, Processor};
///
/// #[derive(Default)]
/// struct Draft {
///     width: Option<u32>,
///     height: Option<u32>,
/// }
///
/// let mut form = Form::new(|d: &Draft| match (d.width, d.height) {
///     (Some(w), Some(h)) => Ok(w * h),
///     _ => Err("Incomplete.".to_string()),
/// })
/// .field(leaf::unsigned_int("Width?"), |d, v| d.width = Some(v))
/// .field(leaf::unsigned_int("Height?"), |d, v| d.height = Some(v));
///
/// assert_eq!(form.process_input("3"), Outcome::Retry("Height?".to_string()));
/// assert_eq!(form.process_input("4"), Outcome::Success(12));
/// ```
pub struct Form<S, T> {
    fields: Vec<Box<dyn Field<S>>>,
    cursor: usize,
    draft: S,
    build: BuildFn<S, T>,
}

impl<S, T> Form<S, T>
where
    S: Default + Send + 'static,
{
    pub fn new(build: impl Fn(&S) -> Result<T, String> + Send + 'static) -> Self {
        Self {
            fields: Vec::new(),
            cursor: 0,
            draft: S::default(),
            build: Box::new(build),
        }
    }

    /// Append a field. `project` stores the field's value into the draft.
    ///
    /// A field runs again when `build` rejects the draft or after a retry,
    /// so `project` must overwrite its slot, never append to it.
    pub fn field<P, F>(mut self, processor: P, project: F) -> Self
    where
        P: Processor + 'static,
        F: Fn(&mut S, P::Output) + Send + 'static,
    {
        self.fields.push(Box::new(Slot { processor, project }));
        self
    }

    /// Index of the field the next message goes to.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The values collected so far.
    pub fn draft(&self) -> &S {
        &self.draft
    }

    fn finish(&self) -> Outcome<T> {
        match (self.build)(&self.draft) {
            Ok(value) => Outcome::Success(value),
            Err(explanation) => {
                Outcome::Retry(with_prompt(&explanation, &self.default_response()))
            }
        }
    }
}

impl<S, T> Processor for Form<S, T>
where
    S: Default + Send + 'static,
{
    type Output = T;

    fn process_input(&mut self, input: &str) -> Outcome<T> {
        let Some(field) = self.fields.get_mut(self.cursor) else {
            // A form without fields only has the aggregate step.
            return self.finish();
        };

        match field.process_input(input, &mut self.draft) {
            Outcome::Success(()) if self.cursor + 1 == self.fields.len() => self.finish(),
            Outcome::Success(()) => {
                self.cursor += 1;
                Outcome::Retry(self.default_response())
            }
            Outcome::Retry(msg) => Outcome::Retry(msg),
            Outcome::Cancel => Outcome::Cancel,
        }
    }

    fn default_response(&self) -> String {
        self.fields
            .get(self.cursor)
            .map(|f| f.default_response())
            .unwrap_or_default()
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.draft = S::default();
        for field in &mut self.fields {
            field.reset();
        }
    }
}
