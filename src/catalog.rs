/// A behaviour to perform and the prompt for spotting it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskPair {
    pub hunted: &'static str,
    pub hunter: &'static str,
}

const BUILTIN_PAIRS: &[TaskPair] = &[
    TaskPair {
        hunted: "Touch your nose three times during the discussion.",
        hunter: "Identify the person who touches their nose three times. They are the counter-revolutionary!",
    },
    TaskPair {
        hunted: "Look at the ceiling three times during the game.",
        hunter: "Find the person who looks at the ceiling three times. They are the traitor!",
    },
    TaskPair {
        hunted: "Stay completely silent for 60 seconds straight.",
        hunter: "Identify who stays silent for 60 seconds. They are the enemy!",
    },
    TaskPair {
        hunted: "Ask three different people why they look nervous.",
        hunter: "Find the person who asks multiple people why they look nervous. They are suspicious!",
    },
    TaskPair {
        hunted: "Accuse someone loudly within the first 30 seconds.",
        hunter: "Identify who makes a loud accusation in the first 30 seconds. They are deflecting!",
    },
    TaskPair {
        hunted: "Repeat everything one specific person says for 2 minutes.",
        hunter: "Find the person who keeps repeating what someone else says. They are the infiltrator!",
    },
    TaskPair {
        hunted: "Complain that at least two people are acting suspiciously.",
        hunter: "Identify who complains about multiple people acting suspiciously. They are projecting!",
    },
    TaskPair {
        hunted: "Cross your arms and keep them crossed for 90 seconds.",
        hunter: "Find the person who keeps their arms crossed for a long time. They are hiding something!",
    },
    TaskPair {
        hunted: "Nervously tap your fingers on the table at least 5 times.",
        hunter: "Identify who nervously taps their fingers on the table repeatedly. They are the spy!",
    },
    TaskPair {
        hunted: "Try to get someone to defend you without asking directly.",
        hunter: "Find the person who tries to get others to defend them. They are manipulating!",
    },
    TaskPair {
        hunted: "Mention the word 'revolution' at least 4 times.",
        hunter: "Identify who keeps saying 'revolution' repeatedly. They are overcompensating!",
    },
    TaskPair {
        hunted: "Avoid eye contact with everyone for 2 minutes.",
        hunter: "Find the person who avoids making eye contact. They are guilty!",
    },
];

const COMRADE_TASK: &str =
    "Watch everyone closely. Someone is performing a secret behaviour. Vote for who you suspect!";

#[derive(Clone, Debug)]
pub struct TaskCatalog {
    pairs: Vec<TaskPair>,
    single_tasks: Vec<&'static str>,
    comrade_task: &'static str,
}

impl TaskCatalog {
    pub fn new(
        pairs: Vec<TaskPair>,
        single_tasks: Vec<&'static str>,
        comrade_task: &'static str,
    ) -> Self {
        Self {
            pairs,
            single_tasks,
            comrade_task,
        }
    }

    /// Built-in content. The single-task list reuses the hunted side of every pair.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_PAIRS.to_vec(),
            BUILTIN_PAIRS.iter().map(|pair| pair.hunted).collect(),
            COMRADE_TASK,
        )
    }

    pub fn pairs(&self) -> &[TaskPair] {
        &self.pairs
    }

    pub fn single_tasks(&self) -> &[&'static str] {
        &self.single_tasks
    }

    pub fn comrade_task(&self) -> &'static str {
        self.comrade_task
    }
}

impl Default for TaskCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
