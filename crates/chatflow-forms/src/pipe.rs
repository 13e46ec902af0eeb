use crate::outcome::{with_prompt, Outcome};
use crate::processor::Processor;

type PipeFn<A, B> = Box<dyn FnMut(A) -> Result<B, String> + Send>;

/// Applies a fallible transformation to what an inner processor produces.
///
/// Retry and cancel behaviour is the inner processor's. When the
/// transformation rejects a value the inner processor is *not* reset; it
/// keeps whatever state it chose to keep after reporting success.
pub struct Pipe<P: Processor, B> {
    inner: P,
    f: PipeFn<P::Output, B>,
}

impl<P: Processor, B> Pipe<P, B> {
    pub fn new(inner: P, f: impl FnMut(P::Output) -> Result<B, String> + Send + 'static) -> Self {
        Self {
            inner,
            f: Box::new(f),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: Processor, B> Processor for Pipe<P, B> {
    type Output = B;

    fn process_input(&mut self, input: &str) -> Outcome<B> {
        match self.inner.process_input(input) {
            Outcome::Success(a) => match (self.f)(a) {
                Ok(b) => Outcome::Success(b),
                Err(explanation) => {
                    Outcome::Retry(with_prompt(&explanation, &self.inner.default_response()))
                }
            },
            Outcome::Retry(msg) => Outcome::Retry(msg),
            Outcome::Cancel => Outcome::Cancel,
        }
    }

    fn default_response(&self) -> String {
        self.inner.default_response()
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf;

    #[test]
    fn inner_errors_pass_through_untouched() {
        let mut p = leaf::unsigned_int("Age?").pipe(|v| {
            if v >= 18 {
                Ok(v)
            } else {
                Err("Too young.".to_string())
            }
        });
        assert_eq!(
            p.process_input("x"),
            Outcome::Retry(format!("{}\nAge?", leaf::NOT_UNSIGNED_INT))
        );
        assert_eq!(p.process_input("12"), Outcome::Retry("Too young.\nAge?".to_string()));
        assert_eq!(p.process_input("30"), Outcome::Success(30));
        assert_eq!(p.process_input("/exit"), Outcome::Cancel);
    }

    #[test]
    fn pipes_change_the_output_type() {
        let mut p = leaf::text("Tags?").pipe(|s| {
            Ok::<_, String>(s.split(',').map(|t| t.trim().to_string()).collect::<Vec<_>>())
        });
        assert_eq!(
            p.process_input("a, b"),
            Outcome::Success(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(p.default_response(), "Tags?");
    }
}
