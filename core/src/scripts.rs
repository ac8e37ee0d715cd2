//! Built-in Scripts
//!
//! The five scripts quill ships with, defined as data: a system prompt,
//! which surface they use, and an optional kickoff input submitted
//! before the human types anything.

/// Which surface a script runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Turn-by-turn chat.
    Chat,
    /// One generation streamed into an editable buffer.
    Editor,
}

/// A built-in script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Script {
    /// Start a "Choose Your Own Adventure" story.
    Adventure,
    /// Resume a saved adventure.
    Continue,
    /// An advanced TypeScript quiz.
    Quiz,
    /// Rewrite a saved story as a dialogue-heavy novella.
    Novella,
    /// Generate an explanatory comment header for a script file.
    Header,
}

const ADVENTURE_PROMPT: &str = r#"The following is a "Choose Your Own Adventure" story with an AI assistant.
The user will start the story, and then the AI will take over.
The AI will progress the story, then offer three options numbered "1.", "2.", and "3." which range from safe to insanely reckless for the user to choose from.
If the user selects one of the options by typing "1.","2.", or "3.", the AI will continue the story from that selected option.
The user is pretty lucky, but the more reckless the choice, then more danger they fall into.
Sometimes their luck will run out and the AI will end the story if something bad happens to the user due to their choice."#;

const QUIZ_PROMPT: &str = r#"The following is an AI giving an Advanced TypeScript Test based on difficult, obscure TypeScript knowledge to a user.

--- Rules for the AI ---
- create incredibly difficult questions, even for the most experienced TypeScript developers.
- act as a quiz machine. Using only logical statements and zero emotion.
- only address the user and avoid using "us", or "let's".
- avoid beginning sentences with "Great", "Awesome", "Cool", etc.
- respect the "User Commands" above all else.
- only explain if the user asks for an explanation.
- ask you a series of 3 questions about TypeScript.
- Each question will have 3 possible answers.
- will present the questions and options as Markdown lists.
- whether the answer is correct or not, the AI immediately moves on to the next question.
- continue asking questions until it has enough information to determine your TypeScript knowledge level.
- score the user from 0 to 100, with 100 being the highest possible score.
- bestow a silly title formatted as a Markdown header 1 based on your score.
--- End Rules for the AI ---

--- User Commands ---
- select one of the answers by typing "1.", "2.", or "3.".
- "start" - cause the AI to immediately present the first question without any introduction.
- "explain" - cause the AI to explain the question and options in more depth
- "skip" - cause the to skip the question and replace it with a different one.
--- End User Commands ---"#;

const NOVELLA_PROMPT: &str = r#"Create a filename for this story, lowercase, dashed, and ending in .txt on the first line
Re-write the story from the "Choose Your Adventure" style into a dialogue-heavy novella
Address the gaps in the story by filling in with details and segues
Introduce lots of funny banter to keep the reader engaged and describe characters and scenes"#;

const HEADER_PROMPT: &str = r#"Use the "TEMPLATE" of a multiline js comment with markdown as an example.
Create a multi-line js comment markdown section to help explain the script to a new user
Use terse, clear language to explain the script in rougly 5 bullet points or less.
Avoid mentioning imported modules or libraries.
Use a markdown blockquote `>` at the end if there's anything confusing or important to note.
Always keep the markdown inside of the multiline js comment.

--- TEMPLATE ---
/*
# Chat with ChatGPT

- Opens the `chat` component
- Type a message and press `enter` to send
- The message is sent to the OpenAI API
- The response from OpenAI is displayed in the chat
- Repeat!
*/

--- END TEMPLATE ---"#;

impl Script {
    /// Human-readable title, shown in the surface's title bar.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Script::Adventure => "Adventure Time",
            Script::Continue => "Continue Adventure",
            Script::Quiz => "TypeScript Quiz",
            Script::Novella => "Create Novella",
            Script::Header => "Add Script Header",
        }
    }

    /// Which surface this script runs on.
    #[must_use]
    pub fn surface(self) -> SurfaceKind {
        match self {
            Script::Adventure | Script::Continue | Script::Quiz => SurfaceKind::Chat,
            Script::Novella | Script::Header => SurfaceKind::Editor,
        }
    }

    /// The system instruction for this script.
    #[must_use]
    pub fn system_prompt(self) -> &'static str {
        match self {
            Script::Adventure | Script::Continue => ADVENTURE_PROMPT,
            Script::Quiz => QUIZ_PROMPT,
            Script::Novella => NOVELLA_PROMPT,
            Script::Header => HEADER_PROMPT,
        }
    }

    /// Input submitted automatically when the script opens, before the
    /// human types anything.
    #[must_use]
    pub fn kickoff(self) -> Option<&'static str> {
        match self {
            Script::Continue => Some(
                "Summarize the story so far. If the last message was from the AI, \
                 re-present the options.",
            ),
            Script::Quiz => Some("start"),
            _ => None,
        }
    }

    /// Keyboard shortcuts (ctrl + key) that submit a canned input.
    #[must_use]
    pub fn shortcuts(self) -> &'static [(char, &'static str)] {
        match self {
            Script::Quiz => &[('e', "explain"), ('s', "skip")],
            _ => &[],
        }
    }
}
